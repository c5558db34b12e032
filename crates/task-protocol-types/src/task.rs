use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Optional resource limits forwarded to the runner untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Memory limit, e.g. `"512m"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,
    /// Timeout duration, e.g. `"30m"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Task-creation payload as posted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Container image reference. An empty string means no image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceConfig>,
}

/// Rejected input: which field, and why.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl TaskRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError {
                field: "title",
                message: "title is required".to_string(),
            });
        }
        Ok(())
    }

    /// Image reference exactly as the caller sent it. An empty string is no image.
    pub fn image_reference(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }
}

/// Canonical task as acknowledged to the caller and shipped to the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Gateway-assigned id, used to poll upload status.
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceConfig>,
    pub creator_device_id: String,
    pub creator_address: String,
    pub created_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Build a record from a request. The request is validated first, so an
    /// invalid request can never produce a record.
    pub fn from_request(
        request: TaskRequest,
        creator_device_id: impl Into<String>,
        creator_address: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        request.validate()?;
        let image = request.image_reference().map(str::to_string);

        Ok(Self {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            image,
            command: request.command,
            env: request.env,
            resources: request.resources,
            creator_device_id: creator_device_id.into(),
            creator_address: creator_address.into(),
            created_at: Utc::now(),
        })
    }
}
