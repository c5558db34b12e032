use crate::ContainerImageOpsError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandRunOutput {
    pub stdout: String,
}

/// Locates and executes the docker CLI.
#[derive(Debug, Clone)]
pub struct DockerCommandRunner {
    executable: String,
}

impl Default for DockerCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCommandRunner {
    pub fn new() -> Self {
        Self {
            executable: resolve_docker_executable(),
        }
    }

    /// Use a specific binary instead of searching for one.
    pub fn with_executable(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub async fn run(
        &self,
        args: &[String],
        timeout_secs: u64,
    ) -> Result<CommandRunOutput, ContainerImageOpsError> {
        let command_repr = format!("{} {}", self.executable, args.join(" "));
        debug!(command = %command_repr, "Running docker command");

        let mut cmd = Command::new(&self.executable);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd.env("DOCKER_CLI_HINTS", "false");

        let output = match timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
            Err(_) => {
                return Err(ContainerImageOpsError::Timeout {
                    command: command_repr,
                    timeout_secs,
                });
            }
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ContainerImageOpsError::RuntimeNotInstalled);
            }
            Ok(Err(err)) => {
                return Err(ContainerImageOpsError::CommandFailed {
                    message: format!("failed to execute docker: {err}"),
                    exit_code: None,
                    stderr: String::new(),
                });
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            return Ok(CommandRunOutput { stdout });
        }

        Err(classify_failed_command(output.status.code(), &stdout, &stderr))
    }
}

fn resolve_docker_executable() -> String {
    if let Ok(path) = std::env::var("DOCKER_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    for candidate in [
        "/usr/local/bin/docker",
        "/opt/homebrew/bin/docker",
        "/usr/bin/docker",
    ] {
        if Path::new(candidate).exists() {
            return candidate.to_string();
        }
    }

    "docker".to_string()
}

pub(crate) fn classify_failed_command(
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> ContainerImageOpsError {
    let combined = format!("{stderr}\n{stdout}").to_ascii_lowercase();

    if combined.contains("cannot connect to the docker daemon")
        || combined.contains("is the docker daemon running")
        || combined.contains("error during connect")
    {
        return ContainerImageOpsError::DaemonUnavailable {
            message: non_empty(stderr, stdout, "docker daemon unavailable"),
        };
    }

    if combined.contains("denied")
        || combined.contains("unauthorized")
        || combined.contains("authentication required")
    {
        return ContainerImageOpsError::RegistryDenied {
            message: non_empty(stderr, stdout, "registry access denied"),
        };
    }

    if combined.contains("invalid reference format") {
        return ContainerImageOpsError::InvalidReference {
            message: non_empty(stderr, stdout, "invalid image reference"),
        };
    }

    if combined.contains("no such image")
        || combined.contains("manifest unknown")
        || combined.contains("not found")
    {
        return ContainerImageOpsError::ImageNotFound {
            message: non_empty(stderr, stdout, "image not found"),
        };
    }

    ContainerImageOpsError::CommandFailed {
        message: non_empty(
            stderr,
            stdout,
            &format!("docker exited with code {exit_code:?}"),
        ),
        exit_code,
        stderr: stderr.to_string(),
    }
}

fn non_empty(primary: &str, secondary: &str, fallback: &str) -> String {
    [primary, secondary]
        .into_iter()
        .find(|candidate| !candidate.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}
