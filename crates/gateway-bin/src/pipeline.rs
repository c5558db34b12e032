//! Background image pipeline: pull if needed, `docker save`, upload to the
//! runner, and record each step in the status store.
//!
//! Runs detached from the request that accepted the task. The archive is
//! removed before the terminal status is written, so `uploaded` or `failed`
//! always means cleanup already happened.

use crate::app::GatewayState;
use container_image_ops::ContainerImageOpsError;
use gateway_database::DatabaseError;
use runner_client::RunnerClientError;
use task_protocol_types::{TaskRecord, TaskUploadState};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("packaging failed: {0}")]
    Packaging(#[from] ContainerImageOpsError),

    #[error("upload failed: {0}")]
    Upload(#[from] RunnerClientError),

    #[error("status store error: {0}")]
    Store(#[from] DatabaseError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Packaging(err) => err.code(),
            Self::Upload(_) => "upload_failed",
            Self::Store(_) => "status_store",
        }
    }
}

/// Start the pipeline for `record` on its own task. The handle is returned
/// for tests; the request path never awaits it.
pub fn spawn(state: GatewayState, record: TaskRecord) -> JoinHandle<()> {
    tokio::spawn(async move { run(&state, &record).await })
}

pub async fn run(state: &GatewayState, record: &TaskRecord) {
    let Some(image) = record.image.as_deref() else {
        return;
    };
    let task_id = record.id.to_string();
    let span = info_span!("image_upload", task_id = %task_id, image = %image);

    async {
        info!("Processing task image");

        let recorded = match package_and_upload(state, &task_id, image, record).await {
            Ok(()) => {
                info!("Task image uploaded");
                state
                    .store
                    .transition(&task_id, TaskUploadState::Uploaded, None)
                    .await
            }
            Err(err) => {
                error!(error = %err, code = err.code(), "Task image pipeline failed");
                state.store.mark_failed(&task_id, err.to_string()).await
            }
        };

        if let Err(err) = recorded {
            error!(error = %err, "Failed to record final upload status");
        }
    }
    .instrument(span)
    .await
}

async fn package_and_upload(
    state: &GatewayState,
    task_id: &str,
    image: &str,
    record: &TaskRecord,
) -> Result<(), PipelineError> {
    state
        .store
        .transition(task_id, TaskUploadState::Packaging, None)
        .await?;

    // The record keeps the caller's string; docker gets it without padding.
    let image = image.trim();
    state.packager.ensure_local(image).await?;
    // A failed save drops its temporary directory before returning.
    let package = state.packager.package(image, state.images_dir()).await?;

    let uploaded = async {
        state
            .store
            .transition(task_id, TaskUploadState::Uploading, None)
            .await?;
        state
            .runner
            .upload_task(record, &package, &state.identity)
            .await?;
        Ok::<(), PipelineError>(())
    }
    .await;

    let archive_dir = package.dir().to_path_buf();
    if let Err(err) = package.close() {
        warn!(error = %err, dir = %archive_dir.display(), "Failed to remove image archive");
    }

    uploaded
}
