use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Progress of the background image upload for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskUploadState {
    Pending,
    Packaging,
    Uploading,
    Uploaded,
    Failed,
}

impl TaskUploadState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Packaging => "packaging",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Uploaded | Self::Failed)
    }

    /// Transitions only move forward; `failed` is reachable from any
    /// non-terminal state, `uploaded` only from `uploading`.
    pub fn can_transition_to(self, next: TaskUploadState) -> bool {
        use TaskUploadState::*;
        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (_, Failed) => true,
            (Pending, Packaging) | (Packaging, Uploading) | (Uploading, Uploaded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskUploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown upload state: {0}")]
pub struct ParseUploadStateError(pub String);

impl FromStr for TaskUploadState {
    type Err = ParseUploadStateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "packaging" => Ok(Self::Packaging),
            "uploading" => Ok(Self::Uploading),
            "uploaded" => Ok(Self::Uploaded),
            "failed" => Ok(Self::Failed),
            other => Err(ParseUploadStateError(other.to_string())),
        }
    }
}

/// Pollable record of a task's image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUploadStatus {
    pub task_id: String,
    pub image: String,
    pub state: TaskUploadState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
