/// Abstraction over external CLI tools (`kubectl`, `docker`, `gcloud`,
/// `git`) for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait ToolExecutor: Send + Sync {
    /// Run a command and capture stdout; stderr is captured into the error.
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError>;

    /// Run a command, streaming stdout/stderr to the terminal.
    async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), ToolError>;

    /// Run a command with the terminal fully attached, stdin included.
    /// Blocks until the command exits — used for interactive shells.
    async fn exec_interactive(&self, program: &str, args: &[String]) -> Result<(), ToolError>;
}

/// Real subprocess executor.
pub struct RealExecutor;

impl ToolExecutor for RealExecutor {
    async fn exec(&self, program: &str, args: &[String]) -> Result<String, ToolError> {
        use std::process::Stdio;

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ToolError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ToolError::InvalidUtf8 {
                program: program.to_owned(),
                source: e,
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(ToolError::CommandFailed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr,
            })
        }
    }

    async fn exec_streaming(&self, program: &str, args: &[String]) -> Result<(), ToolError> {
        use std::process::Stdio;

        let status = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ToolError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::CommandFailed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_interactive(&self, program: &str, args: &[String]) -> Result<(), ToolError> {
        use std::process::Stdio;

        let status = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ToolError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::CommandFailed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{program} not found on PATH — is it installed?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },
}

impl ToolError {
    /// Captured stderr for failed commands, when there is any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ToolError::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
