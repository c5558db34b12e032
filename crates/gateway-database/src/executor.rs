//! Async SQLite executor on a dedicated background thread.
//!
//! All statements are sent over a channel to one SQLite thread, so callers
//! await results without blocking the Tokio runtime and writes execute in
//! FIFO order. Only SQL and light row mapping belong inside [`AsyncDatabase::call`].

use crate::{migrations, DatabaseError, DatabaseResult};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

fn from_tokio_rusqlite(e: tokio_rusqlite::Error) -> DatabaseError {
    match e {
        tokio_rusqlite::Error::Rusqlite(e) => DatabaseError::Sqlite(e),
        tokio_rusqlite::Error::Close(_) => DatabaseError::Connection("Connection closed".to_string()),
        other => DatabaseError::Connection(other.to_string()),
    }
}

#[derive(Clone)]
pub struct AsyncDatabase {
    conn: Connection,
    path: String,
}

impl AsyncDatabase {
    /// Open (creating if needed) the database at `path`, enable WAL, and
    /// apply pending migrations.
    pub async fn open(path: &Path) -> DatabaseResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, "Opening task database");

        let conn = Connection::open(path)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Self::initialize(conn, path_str).await
    }

    /// Private in-memory database.
    pub async fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Self::initialize(conn, ":memory:".to_string()).await
    }

    async fn initialize(conn: Connection, path: String) -> DatabaseResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA temp_store = MEMORY;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
            Ok(())
        })
        .await
        .map_err(from_tokio_rusqlite)?;

        let db = Self { conn, path };
        db.call(|conn| migrations::run_migrations(conn)).await?;

        info!(path = %db.path, "Task database ready");
        Ok(db)
    }

    /// Run `f` on the SQLite thread and await its result.
    pub async fn call<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DatabaseResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // The inner DatabaseResult rides inside tokio_rusqlite's Ok so that
        // domain errors are not flattened into connection errors.
        let outer = self.conn.call(move |conn| Ok(f(conn))).await;

        match outer {
            Ok(inner) => inner,
            Err(e) => Err(from_tokio_rusqlite(e)),
        }
    }

    pub async fn health_check(&self) -> DatabaseResult<()> {
        self.call(|conn| {
            conn.execute_batch("SELECT 1")?;
            Ok(())
        })
        .await?;
        debug!("Database health check passed");
        Ok(())
    }

    /// Wait for queued statements, then stop the executor thread.
    pub async fn close(self) -> DatabaseResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to close database: {e:?}")))?;
        info!(path = %self.path, "Database closed");
        Ok(())
    }
}
