//! # Task Protocol Types
//!
//! Pure data types shared by the gateway's HTTP surface, its background
//! upload pipeline, and the status store. Nothing here performs I/O.

mod status;
mod task;

pub use status::{ParseUploadStateError, TaskUploadState, TaskUploadStatus};
pub use task::{ResourceConfig, TaskRecord, TaskRequest, ValidationError};

use serde::{Deserialize, Serialize};

/// Header carrying the gateway's device id on outbound requests.
pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

/// Header carrying the creator's checksummed address on outbound requests.
pub const CREATOR_ADDRESS_HEADER: &str = "X-Creator-Address";

/// JSON error body returned by the gateway: `{"status":400,"message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpError {
    pub status: u16,
    pub message: String,
}

impl HttpError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
