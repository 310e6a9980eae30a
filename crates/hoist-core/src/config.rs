use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name of the per-project configuration.
pub const CONFIG_FILE: &str = "hoist.json";

/// hoist.json configuration.
///
/// Written once by `hoist init`; loaded once per invocation and immutable
/// for the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Application name, also the local container repository name.
    pub name: String,
    /// Kubernetes namespace the app deploys into.
    pub namespace: String,
    /// Private registry host (e.g. `localhost:5000`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Google Cloud project id; when set, images push to `gcr.io`.
    #[serde(
        default,
        rename = "gceProject",
        skip_serializing_if = "Option::is_none"
    )]
    pub gce_project: Option<String>,
}

impl ProjectConfig {
    /// Load from hoist.json in the given project directory.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        serde_json::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    /// Write hoist.json into the given project directory.
    pub fn save(&self, project_dir: &Path) -> crate::Result<()> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigEncode { source: e })?;
        std::fs::write(&config_path, content).map_err(|e| crate::Error::ConfigWrite {
            path: config_path,
            source: e,
        })
    }

    /// True when pushes go through `gcloud` rather than plain `docker`.
    pub fn uses_gcloud(&self) -> bool {
        self.gce_project.is_some()
    }

    /// Registry-qualified name for a locally built container.
    ///
    /// `gceProject` wins over `registry` when both are set.
    pub fn remote_image(&self, container: &str) -> crate::Result<String> {
        if let Some(gce_project) = &self.gce_project {
            Ok(format!("gcr.io/{gce_project}/{container}"))
        } else if let Some(registry) = &self.registry {
            Ok(format!("{registry}/{container}"))
        } else {
            Err(crate::Error::NoRegistry)
        }
    }
}
