use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File listing the custom resource definitions a template depends on.
pub const CRD_REQUIREMENTS_FILE: &str = "crd-requirements.txt";

/// CRD names a project's templates require to be installed on the cluster.
///
/// One name per line (e.g. `tfjobs.kubeflow.org`); blank lines and `#`
/// comments are ignored.
#[derive(Debug, Clone, Default)]
pub struct CrdRequirements {
    pub required: BTreeSet<String>,
}

impl CrdRequirements {
    /// Load the requirements file from a project directory.
    ///
    /// `Ok(None)` when the project has no requirements file — templates
    /// without CRD dependencies simply don't ship one.
    pub fn load(project_dir: &Path) -> Result<Option<Self>, CrdFileError> {
        let path = project_dir.join(CRD_REQUIREMENTS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CrdFileError::Read { path, source: e })?;
        Ok(Some(Self::parse(&content)))
    }

    pub fn parse(content: &str) -> Self {
        let required = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_owned)
            .collect();
        Self { required }
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrdFileError {
    #[error("failed to read CRD requirements from {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
