use crate::executor::{RealExecutor, ToolError, ToolExecutor};

/// Where a push goes, keyed on the project's registry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushTarget {
    /// `docker push` to a private registry.
    Registry,
    /// `gcloud docker -- push` to gcr.io.
    Gcloud,
}

/// Container tooling client, parameterized over the executor for
/// testability.
pub struct DockerClient<E: ToolExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ToolExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Build the project directory into a locally tagged image,
    /// streaming build output to the terminal.
    pub async fn build(&self, tag: &str) -> Result<(), DockerError> {
        self.executor
            .exec_streaming("docker", &args(["build", "-t", tag, "."]))
            .await
            .map_err(|e| DockerError::Build { source: e })
    }

    pub async fn tag(&self, local: &str, remote: &str) -> Result<(), DockerError> {
        self.executor
            .exec("docker", &args(["tag", local, remote]))
            .await
            .map(|_| ())
            .map_err(|e| DockerError::Tag { source: e })
    }

    /// Push a tagged image to its registry.
    ///
    /// Output is captured, not streamed — the caller renders a progress
    /// estimate while this future runs, and a failure's stderr is
    /// surfaced through the error.
    pub async fn push(&self, remote: &str, target: PushTarget) -> Result<(), DockerError> {
        let result = match target {
            PushTarget::Registry => self.executor.exec("docker", &args(["push", remote])).await,
            PushTarget::Gcloud => {
                self.executor
                    .exec("gcloud", &args(["docker", "--", "push", remote]))
                    .await
            }
        };
        result.map(|_| ()).map_err(|e| DockerError::Push { source: e })
    }
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("container build failed")]
    Build { source: ToolError },

    #[error("tagging image failed")]
    Tag { source: ToolError },

    #[error("image push failed")]
    Push { source: ToolError },
}

impl DockerError {
    /// Captured stderr of the failed tool invocation, when available.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            DockerError::Build { source }
            | DockerError::Tag { source }
            | DockerError::Push { source } => source.stderr(),
        }
    }
}
