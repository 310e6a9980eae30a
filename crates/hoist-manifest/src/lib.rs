//! Manifest template handling for hoist.
//!
//! # Deploy pipeline
//!
//! ```text
//! hoist deploy
//!   1. Push        ── docker tag + push (or gcloud docker -- push)
//!   2. Render      ── k8s-templates/ → k8s/, one run id per invocation
//!   3. Debug patch ── optional: sleep command + debug=true label
//!   4. Apply       ── kubectl --namespace <ns> apply -R -f k8s
//! ```
//!
//! Templates use `$image`, `$app` and `$run` placeholders (`${...}` and
//! `$$` work as in shell-style substitution). The rendered `k8s/`
//! directory is regenerated from scratch on every deploy.

pub mod crd;
pub mod patch;
pub mod render;

pub use crd::CrdRequirements;
pub use render::Substitutions;
