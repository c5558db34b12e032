//! Local SQLite persistence for the gateway.
//!
//! The only table tracks the background image pipeline per task, so that a
//! caller who received a 202 can later learn whether the image reached the
//! runner.

mod error;
mod executor;
mod migrations;
mod queries;
mod task_status;

pub use error::{DatabaseError, DatabaseResult};
pub use executor::AsyncDatabase;
pub use task_status::{TaskStatusStore, INTERRUPTED_MESSAGE};
