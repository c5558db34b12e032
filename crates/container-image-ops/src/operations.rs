use crate::command_runner::DockerCommandRunner;
use crate::package::{archive_file_name, ImagePackage};
use crate::ContainerImageOpsError;
use std::path::Path;
use tracing::{debug, info};

const TIMEOUT_INSPECT_SECS: u64 = 30;
const TIMEOUT_VERSION_SECS: u64 = 10;

/// Whether [`ImagePackager::ensure_local`] had to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyPresent,
    Pulled,
}

/// Docker-backed image packaging: make an image available locally, then
/// serialize it into a scoped archive.
#[derive(Debug, Clone)]
pub struct ImagePackager {
    runner: DockerCommandRunner,
    pull_timeout_secs: u64,
    save_timeout_secs: u64,
}

impl ImagePackager {
    pub fn new(runner: DockerCommandRunner, pull_timeout_secs: u64, save_timeout_secs: u64) -> Self {
        Self {
            runner,
            pull_timeout_secs,
            save_timeout_secs,
        }
    }

    pub async fn image_exists(&self, image: &str) -> Result<bool, ContainerImageOpsError> {
        validate_image_reference(image)?;
        let args = vec![
            "image".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Id}}".to_string(),
            image.to_string(),
        ];

        match self.runner.run(&args, TIMEOUT_INSPECT_SECS).await {
            Ok(_) => Ok(true),
            Err(ContainerImageOpsError::ImageNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub async fn pull(&self, image: &str) -> Result<(), ContainerImageOpsError> {
        validate_image_reference(image)?;
        info!(image, "Pulling image");
        let args = vec!["pull".to_string(), "--quiet".to_string(), image.to_string()];
        self.runner.run(&args, self.pull_timeout_secs).await?;
        info!(image, "Image pulled");
        Ok(())
    }

    /// Pull the image only if it is not already present locally.
    pub async fn ensure_local(&self, image: &str) -> Result<EnsureOutcome, ContainerImageOpsError> {
        if self.image_exists(image).await? {
            debug!(image, "Image already present locally");
            return Ok(EnsureOutcome::AlreadyPresent);
        }
        self.pull(image).await?;
        Ok(EnsureOutcome::Pulled)
    }

    /// `docker save` the image into a fresh directory under `work_dir`.
    ///
    /// On failure nothing is left behind in `work_dir`.
    pub async fn package(
        &self,
        image: &str,
        work_dir: &Path,
    ) -> Result<ImagePackage, ContainerImageOpsError> {
        validate_image_reference(image)?;
        tokio::fs::create_dir_all(work_dir).await?;

        let dir = tempfile::Builder::new()
            .prefix("image-")
            .tempdir_in(work_dir)?;
        let archive_path = dir.path().join(archive_file_name(image));

        let args = vec![
            "save".to_string(),
            "-o".to_string(),
            archive_path.to_string_lossy().into_owned(),
            image.to_string(),
        ];
        self.runner.run(&args, self.save_timeout_secs).await?;

        let size_bytes = tokio::fs::metadata(&archive_path).await?.len();
        info!(
            image,
            archive = %archive_path.display(),
            size_bytes,
            "Image archived"
        );

        Ok(ImagePackage::new(image, dir, archive_path, size_bytes))
    }

    /// Server version reported by the docker daemon.
    pub async fn runtime_version(&self) -> Result<String, ContainerImageOpsError> {
        let args = vec![
            "version".to_string(),
            "--format".to_string(),
            "{{.Server.Version}}".to_string(),
        ];
        let output = self.runner.run(&args, TIMEOUT_VERSION_SECS).await?;
        Ok(output.stdout)
    }
}

/// Reject references docker would misread as flags or that cannot name an image.
pub fn validate_image_reference(image: &str) -> Result<(), ContainerImageOpsError> {
    if image.trim().is_empty() {
        return Err(ContainerImageOpsError::InvalidReference {
            message: "image reference is empty".to_string(),
        });
    }
    if image.starts_with('-') {
        return Err(ContainerImageOpsError::InvalidReference {
            message: format!("image reference must not start with '-': {image}"),
        });
    }
    if image.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ContainerImageOpsError::InvalidReference {
            message: format!("image reference contains whitespace: {image:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_flag_like_and_blank_refs() {
        assert!(validate_image_reference("alpine:3.19").is_ok());
        assert!(validate_image_reference("ghcr.io/acme/app@sha256:abc").is_ok());
        assert!(validate_image_reference("").is_err());
        assert!(validate_image_reference("--output=/etc").is_err());
        assert!(validate_image_reference("alpine latest").is_err());
    }

    #[tokio::test]
    async fn invalid_reference_never_reaches_docker() {
        let packager = ImagePackager::new(
            DockerCommandRunner::with_executable("/nonexistent/bin/docker"),
            5,
            5,
        );
        let dir = tempfile::tempdir().unwrap();

        let err = packager.package("-rm", dir.path()).await.unwrap_err();
        assert!(matches!(err, ContainerImageOpsError::InvalidReference { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_save_leaves_no_directory() {
        let packager = ImagePackager::new(
            DockerCommandRunner::with_executable("/nonexistent/bin/docker"),
            5,
            5,
        );
        let dir = tempfile::tempdir().unwrap();

        let err = packager.package("alpine", dir.path()).await.unwrap_err();
        assert!(matches!(err, ContainerImageOpsError::RuntimeNotInstalled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
