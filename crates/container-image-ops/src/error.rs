use thiserror::Error;

/// Error taxonomy for container runtime operations.
#[derive(Debug, Error)]
pub enum ContainerImageOpsError {
    #[error("docker CLI is not installed")]
    RuntimeNotInstalled,

    #[error("docker daemon is not reachable: {message}")]
    DaemonUnavailable { message: String },

    #[error("image not found: {message}")]
    ImageNotFound { message: String },

    #[error("registry denied access: {message}")]
    RegistryDenied { message: String },

    #[error("invalid image reference: {message}")]
    InvalidReference { message: String },

    #[error("docker command failed: {message}")]
    CommandFailed {
        message: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("docker command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("image archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerImageOpsError {
    /// Stable machine-readable error code, recorded with failed uploads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RuntimeNotInstalled => "runtime_not_installed",
            Self::DaemonUnavailable { .. } => "daemon_unavailable",
            Self::ImageNotFound { .. } => "image_not_found",
            Self::RegistryDenied { .. } => "registry_denied",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::CommandFailed { .. } => "command_failed",
            Self::Timeout { .. } => "timeout",
            Self::Io(_) => "io_error",
        }
    }
}
