use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write config to {path}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode config")]
    ConfigEncode { source: serde_json::Error },

    #[error("no state record at {path}")]
    StateMissing { path: PathBuf },

    #[error("failed to load state record from {path}")]
    StateLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse state record at {path}")]
    StateParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write state record to {path}")]
    StateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode state record")]
    StateEncode { source: serde_json::Error },

    #[error(
        "no container registry configured — set \"registry\" or \"gceProject\" in hoist.json"
    )]
    NoRegistry,
}
