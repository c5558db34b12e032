//! Storage trait definitions.

use crate::StorageResult;

/// Backend for small secret values keyed by name.
pub trait SecureStorage: Send + Sync {
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
