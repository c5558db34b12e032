//! File system layout for the gateway.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Resolves every on-disk location the gateway uses, rooted at `~/.parity`.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".parity"),
        })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// `~/.parity/config.json`
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Directory holding the sealed keystore and its master key.
    pub fn keystore_dir(&self) -> PathBuf {
        self.base_dir.join("keystore")
    }

    /// `~/.parity/tasks.sqlite`
    pub fn task_database_file(&self) -> PathBuf {
        self.base_dir.join("tasks.sqlite")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// `~/.parity/logs/gateway.jsonl`
    pub fn gateway_log_file(&self) -> PathBuf {
        self.logs_dir().join("gateway.jsonl")
    }

    /// Scratch space for image archives awaiting upload.
    pub fn images_work_dir(&self) -> PathBuf {
        self.base_dir.join("images")
    }

    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.keystore_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.images_work_dir())?;
        Ok(())
    }
}
