use std::path::Path;
use std::time::Duration;

use crate::executor::{RealExecutor, ToolError, ToolExecutor};

/// Seconds between pod readiness probes.
const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Cluster operations client, parameterized over the executor for
/// testability.
pub struct KubectlClient<E: ToolExecutor = RealExecutor> {
    executor: E,
}

impl KubectlClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for KubectlClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ToolExecutor> KubectlClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Namespaces ──

    pub async fn namespace_exists(&self, namespace: &str) -> bool {
        self.executor
            .exec("kubectl", &args(["get", "namespace", namespace]))
            .await
            .is_ok()
    }

    /// Create the namespace if it does not exist yet.
    ///
    /// Two deploys racing to create the same namespace both succeed: a
    /// create that loses the race fails with `AlreadyExists`, which is the
    /// state we wanted.
    pub async fn ensure_namespace(&self, namespace: &str) -> Result<(), ClusterError> {
        if self.namespace_exists(namespace).await {
            return Ok(());
        }

        tracing::debug!(namespace, "creating namespace");
        match self
            .executor
            .exec("kubectl", &args(["create", "namespace", namespace]))
            .await
        {
            Ok(_) => Ok(()),
            Err(ToolError::CommandFailed { ref stderr, .. })
                if stderr.contains("AlreadyExists") =>
            {
                Ok(())
            }
            Err(e) => Err(ClusterError::Namespace {
                namespace: namespace.to_owned(),
                source: e,
            }),
        }
    }

    // ── Manifests ──

    /// Recursively apply every manifest under `dir`.
    pub async fn apply(&self, namespace: &str, dir: &Path) -> Result<(), ClusterError> {
        let dir = path_str(dir)?;
        self.executor
            .exec_streaming(
                "kubectl",
                &args(["--namespace", namespace, "apply", "-R", "-f", dir]),
            )
            .await
            .map_err(|e| ClusterError::Apply { source: e })
    }

    /// Recursively delete every resource described under `dir`.
    pub async fn delete(&self, namespace: &str, dir: &Path) -> Result<(), ClusterError> {
        let dir = path_str(dir)?;
        self.executor
            .exec_streaming(
                "kubectl",
                &args(["--namespace", namespace, "delete", "-R", "-f", dir]),
            )
            .await
            .map_err(|e| ClusterError::Delete { source: e })
    }

    // ── Pods ──

    /// Name of the most recently started pod in the namespace.
    pub async fn latest_pod(&self, namespace: &str) -> Result<String, ClusterError> {
        let output = self
            .executor
            .exec(
                "kubectl",
                &args([
                    "get",
                    "pods",
                    "--namespace",
                    namespace,
                    "--sort-by",
                    ".status.startTime",
                    "-o",
                    "name",
                ]),
            )
            .await
            .map_err(|e| ClusterError::PodList { source: e })?;

        output
            .lines()
            .last()
            .map(|line| line.trim().trim_start_matches("pod/").to_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClusterError::NoPods {
                namespace: namespace.to_owned(),
            })
    }

    pub async fn pod_phase(&self, namespace: &str, pod: &str) -> Result<String, ClusterError> {
        let output = self
            .executor
            .exec(
                "kubectl",
                &args([
                    "get",
                    "pod",
                    pod,
                    "--namespace",
                    namespace,
                    "-o",
                    "jsonpath={.status.phase}",
                ]),
            )
            .await
            .map_err(|e| ClusterError::PodStatus {
                pod: pod.to_owned(),
                source: e,
            })?;

        Ok(output.trim().to_owned())
    }

    /// Poll a pod once per second until it reports `Running`.
    ///
    /// `attempts` is the whole retry budget; exhausting it is terminal,
    /// the caller is not expected to retry further.
    pub async fn wait_until_running(
        &self,
        namespace: &str,
        pod: &str,
        attempts: u32,
    ) -> Result<(), ClusterError> {
        for attempt in 1..=attempts {
            let phase = self.pod_phase(namespace, pod).await?;
            if phase == "Running" {
                return Ok(());
            }
            tracing::debug!(pod, phase = %phase, attempt, "pod not running yet");
            if attempt < attempts {
                tokio::time::sleep(READINESS_POLL_INTERVAL).await;
            }
        }
        Err(ClusterError::PodNotRunning {
            pod: pod.to_owned(),
            attempts,
        })
    }

    /// Attach an interactive shell to a pod. Blocks until the shell exits.
    pub async fn attach(&self, namespace: &str, pod: &str) -> Result<(), ClusterError> {
        self.executor
            .exec_interactive(
                "kubectl",
                &args([
                    "exec",
                    "-it",
                    pod,
                    "--namespace",
                    namespace,
                    "--",
                    "/bin/bash",
                ]),
            )
            .await
            .map_err(|e| ClusterError::Attach {
                pod: pod.to_owned(),
                source: e,
            })
    }
}

// ── Helpers ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn path_str(path: &Path) -> Result<&str, ClusterError> {
    path.to_str()
        .ok_or_else(|| ClusterError::InvalidPath(path.to_path_buf()))
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("manifest path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("failed to ensure namespace '{namespace}'")]
    Namespace { namespace: String, source: ToolError },

    #[error("applying manifests failed")]
    Apply { source: ToolError },

    #[error("deleting deployed resources failed")]
    Delete { source: ToolError },

    #[error("failed to list pods")]
    PodList { source: ToolError },

    #[error("no pods found in namespace '{namespace}'")]
    NoPods { namespace: String },

    #[error("failed to read status of pod '{pod}'")]
    PodStatus { pod: String, source: ToolError },

    #[error("pod '{pod}' did not reach Running within {attempts} attempts")]
    PodNotRunning { pod: String, attempts: u32 },

    #[error("failed to attach to pod '{pod}'")]
    Attach { pod: String, source: ToolError },
}
