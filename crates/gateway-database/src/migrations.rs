//! Versioned schema migrations, tracked in the `migrations` table.

use crate::{DatabaseError, DatabaseResult};
use rusqlite::Connection;
use tracing::{debug, info};

pub const CURRENT_VERSION: i32 = 2;

pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema v{current_version} is newer than this gateway supports (v{CURRENT_VERSION})"
        )));
    }

    if current_version == CURRENT_VERSION {
        debug!(current_version, "Schema up to date");
        return Ok(());
    }

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_task_uploads(conn)?;
    }
    if current_version < 2 {
        migrate_v2_state_index(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: one row per task whose image is shipped by the background pipeline.
fn migrate_v1_task_uploads(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS task_uploads (
            task_id TEXT PRIMARY KEY,
            image TEXT NOT NULL,
            state TEXT NOT NULL,
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )?;
    record_migration(conn, 1, "task_uploads")
}

/// V2: startup recovery scans non-terminal rows by state.
fn migrate_v2_state_index(conn: &Connection) -> DatabaseResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_task_uploads_state ON task_uploads(state);",
    )?;
    record_migration(conn, 2, "task_uploads_state_index")
}
