//! Gateway state definition.

use container_image_ops::{DockerCommandRunner, ImagePackager};
use device_identity_crypto::Identity;
use gateway_config_and_utils::Config;
use gateway_database::TaskStatusStore;
use runner_client::RunnerClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Shared gateway state. Cloned into every request and pipeline task.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Resolved once at startup; re-running `auth` needs a restart.
    pub identity: Arc<Identity>,
    pub runner: RunnerClient,
    pub packager: ImagePackager,
    /// Per-task upload status, polled via `GET /gateway/tasks/{id}`.
    pub store: TaskStatusStore,
    /// Parent of every per-upload temporary directory.
    pub images_dir: Arc<PathBuf>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(
        config: Config,
        identity: Identity,
        store: TaskStatusStore,
        images_dir: PathBuf,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let runner = RunnerClient::new(config.runner_url()?, &config.timeouts)?;

        let docker = match config.docker.executable.as_deref() {
            Some(executable) if !executable.trim().is_empty() => {
                DockerCommandRunner::with_executable(executable.trim())
            }
            _ => DockerCommandRunner::new(),
        };
        let packager = ImagePackager::new(
            docker,
            config.timeouts.image_pull_secs,
            config.timeouts.image_save_secs,
        );

        Ok(Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
            runner,
            packager,
            store,
            images_dir: Arc::new(images_dir),
            started_at: Instant::now(),
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}
