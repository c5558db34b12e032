use crate::{queries, AsyncDatabase, DatabaseResult};
use chrono::Utc;
use std::path::Path;
use task_protocol_types::{TaskUploadState, TaskUploadStatus};
use tracing::{debug, warn};

/// Error text written to rows that were still in flight when the gateway stopped.
pub const INTERRUPTED_MESSAGE: &str = "interrupted by gateway restart";

/// Pollable per-task state of the background image pipeline.
#[derive(Clone)]
pub struct TaskStatusStore {
    db: AsyncDatabase,
}

impl TaskStatusStore {
    pub async fn open(path: &Path) -> DatabaseResult<Self> {
        Ok(Self::new(AsyncDatabase::open(path).await?))
    }

    pub async fn open_in_memory() -> DatabaseResult<Self> {
        Ok(Self::new(AsyncDatabase::open_in_memory().await?))
    }

    pub fn new(db: AsyncDatabase) -> Self {
        Self { db }
    }

    pub async fn insert_pending(&self, task_id: &str, image: &str) -> DatabaseResult<TaskUploadStatus> {
        let task_id = task_id.to_string();
        let image = image.to_string();
        let now = Utc::now();
        let status = self
            .db
            .call(move |conn| queries::insert_pending(conn, &task_id, &image, now))
            .await?;
        debug!(task_id = %status.task_id, image = %status.image, "Upload status created");
        Ok(status)
    }

    pub async fn transition(
        &self,
        task_id: &str,
        next: TaskUploadState,
        error: Option<String>,
    ) -> DatabaseResult<TaskUploadStatus> {
        let task_id = task_id.to_string();
        let now = Utc::now();
        let status = self
            .db
            .call(move |conn| queries::transition(conn, &task_id, next, error.as_deref(), now))
            .await?;
        debug!(task_id = %status.task_id, state = %status.state, "Upload status changed");
        Ok(status)
    }

    pub async fn mark_failed(
        &self,
        task_id: &str,
        message: impl Into<String>,
    ) -> DatabaseResult<TaskUploadStatus> {
        self.transition(task_id, TaskUploadState::Failed, Some(message.into()))
            .await
    }

    pub async fn get(&self, task_id: &str) -> DatabaseResult<Option<TaskUploadStatus>> {
        let task_id = task_id.to_string();
        self.db.call(move |conn| queries::get(conn, &task_id)).await
    }

    /// Fail rows a previous process left in a live state. Run once at startup,
    /// before any new pipeline is spawned.
    pub async fn fail_interrupted(&self) -> DatabaseResult<usize> {
        let now = Utc::now();
        let changed = self
            .db
            .call(move |conn| queries::fail_live(conn, INTERRUPTED_MESSAGE, now))
            .await?;
        if changed > 0 {
            warn!(count = changed, "Marked interrupted uploads as failed");
        }
        Ok(changed)
    }

    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.db.health_check().await
    }
}
