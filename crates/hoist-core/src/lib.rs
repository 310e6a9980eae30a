//! Core types for hoist.
//!
//! This crate defines the `hoist.json` schema ([`ProjectConfig`]), the
//! build/push state records ([`BuildRecord`], [`PushRecord`]), and shared
//! error types.

pub mod config;
pub mod error;
pub mod state;

pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use state::{BuildRecord, PushRecord};
