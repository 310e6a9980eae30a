use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Record of the last successful `hoist build`, persisted as `.build.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Tag of the image produced by the last build.
    pub last_container: String,
    /// Wall-clock seconds the build took; feeds the next progress estimate.
    pub last_build_duration: f64,
}

/// Record of the last successful image push, persisted as `.push.json`.
///
/// Written only after the push tool exited zero; a failed push leaves the
/// previous record untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRecord {
    /// Registry-qualified name the image was pushed as.
    pub last_remote_container: String,
    /// Wall-clock seconds the push took; feeds the next progress estimate.
    pub last_push_duration: f64,
}

pub const BUILD_STATE_FILE: &str = ".build.json";
pub const PUSH_STATE_FILE: &str = ".push.json";

impl BuildRecord {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(BUILD_STATE_FILE)
    }

    pub fn exists(project_dir: &Path) -> bool {
        Self::path(project_dir).exists()
    }

    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        load_record(&Self::path(project_dir))
    }

    pub fn save(&self, project_dir: &Path) -> crate::Result<()> {
        save_record(&Self::path(project_dir), self)
    }
}

impl PushRecord {
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(PUSH_STATE_FILE)
    }

    pub fn exists(project_dir: &Path) -> bool {
        Self::path(project_dir).exists()
    }

    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        load_record(&Self::path(project_dir))
    }

    pub fn save(&self, project_dir: &Path) -> crate::Result<()> {
        save_record(&Self::path(project_dir), self)
    }
}

fn load_record<T: serde::de::DeserializeOwned>(path: &Path) -> crate::Result<T> {
    if !path.exists() {
        return Err(crate::Error::StateMissing {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|e| crate::Error::StateLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| crate::Error::StateParse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn save_record<T: Serialize>(path: &Path, record: &T) -> crate::Result<()> {
    let content =
        serde_json::to_string(record).map_err(|e| crate::Error::StateEncode { source: e })?;
    std::fs::write(path, content).map_err(|e| crate::Error::StateWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
