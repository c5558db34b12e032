//! Database error types.

use task_protocol_types::TaskUploadState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested state change would move a task backwards or out of a terminal state.
    #[error("Task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskUploadState,
        to: TaskUploadState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored row could not be decoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
