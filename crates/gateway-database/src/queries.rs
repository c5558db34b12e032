//! SQL for the `task_uploads` table. Every function runs on the executor thread.

use crate::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use task_protocol_types::{TaskUploadState, TaskUploadStatus};

const SELECT_COLUMNS: &str = "task_id, image, state, error, created_at, updated_at";

const LIVE_STATES: [TaskUploadState; 3] = [
    TaskUploadState::Pending,
    TaskUploadState::Packaging,
    TaskUploadState::Uploading,
];

pub fn insert_pending(
    conn: &Connection,
    task_id: &str,
    image: &str,
    now: DateTime<Utc>,
) -> DatabaseResult<TaskUploadStatus> {
    let stamp = now.to_rfc3339();
    conn.execute(
        "INSERT INTO task_uploads (task_id, image, state, error, created_at, updated_at)
         VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
        params![task_id, image, TaskUploadState::Pending.as_str(), stamp],
    )?;

    Ok(TaskUploadStatus {
        task_id: task_id.to_string(),
        image: image.to_string(),
        state: TaskUploadState::Pending,
        error: None,
        created_at: now,
        updated_at: now,
    })
}

pub fn get(conn: &Connection, task_id: &str) -> DatabaseResult<Option<TaskUploadStatus>> {
    let raw = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM task_uploads WHERE task_id = ?1"),
            [task_id],
            RawStatus::from_row,
        )
        .optional()?;

    raw.map(RawStatus::decode).transpose()
}

/// Move a task to `next`, rejecting backwards or post-terminal moves.
pub fn transition(
    conn: &Connection,
    task_id: &str,
    next: TaskUploadState,
    error: Option<&str>,
    now: DateTime<Utc>,
) -> DatabaseResult<TaskUploadStatus> {
    let tx = conn.unchecked_transaction()?;

    let mut status =
        get(&tx, task_id)?.ok_or_else(|| DatabaseError::NotFound(format!("task {task_id}")))?;

    if !status.state.can_transition_to(next) {
        return Err(DatabaseError::InvalidTransition {
            task_id: task_id.to_string(),
            from: status.state,
            to: next,
        });
    }

    tx.execute(
        "UPDATE task_uploads SET state = ?2, error = ?3, updated_at = ?4 WHERE task_id = ?1",
        params![task_id, next.as_str(), error, now.to_rfc3339()],
    )?;
    tx.commit()?;

    status.state = next;
    status.error = error.map(str::to_string);
    status.updated_at = now;
    Ok(status)
}

/// Mark every non-terminal row as failed. Returns the number of rows touched.
pub fn fail_live(conn: &Connection, message: &str, now: DateTime<Utc>) -> DatabaseResult<usize> {
    let changed = conn.execute(
        "UPDATE task_uploads SET state = ?1, error = ?2, updated_at = ?3
         WHERE state IN (?4, ?5, ?6)",
        params![
            TaskUploadState::Failed.as_str(),
            message,
            now.to_rfc3339(),
            LIVE_STATES[0].as_str(),
            LIVE_STATES[1].as_str(),
            LIVE_STATES[2].as_str(),
        ],
    )?;
    Ok(changed)
}

struct RawStatus {
    task_id: String,
    image: String,
    state: String,
    error: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawStatus {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            task_id: row.get(0)?,
            image: row.get(1)?,
            state: row.get(2)?,
            error: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn decode(self) -> DatabaseResult<TaskUploadStatus> {
        Ok(TaskUploadStatus {
            state: self
                .state
                .parse()
                .map_err(|e: task_protocol_types::ParseUploadStateError| {
                    DatabaseError::InvalidData(e.to_string())
                })?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            task_id: self.task_id,
            image: self.image,
            error: self.error,
        })
    }
}

fn parse_timestamp(raw: &str) -> DatabaseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidData(format!("bad timestamp {raw:?}: {e}")))
}
