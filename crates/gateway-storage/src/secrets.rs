//! High-level API for the gateway's identity secrets.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use tracing::info;

pub struct SecretsManager {
    storage: Box<dyn SecureStorage>,
}

impl SecretsManager {
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    // ==========================================
    // Signing key
    // ==========================================

    /// Store the operator's private key (hex, without `0x`).
    pub fn set_private_key_hex(&self, private_key_hex: &str) -> StorageResult<()> {
        let normalized = private_key_hex.trim().trim_start_matches("0x");
        if normalized.is_empty() {
            return Err(StorageError::Encoding("private key is empty".to_string()));
        }
        self.storage
            .set(StorageKeys::PRIVATE_KEY, &normalized.to_ascii_lowercase())
    }

    pub fn get_private_key_hex(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::PRIVATE_KEY)
    }

    pub fn has_private_key(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::PRIVATE_KEY)
    }

    // ==========================================
    // Device identity
    // ==========================================

    pub fn set_device_id(&self, device_id: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::DEVICE_ID, device_id)
    }

    pub fn get_device_id(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::DEVICE_ID)
    }

    /// Return the persisted device id, generating and storing a UUID v4 on first use.
    pub fn ensure_device_id(&self) -> StorageResult<String> {
        if let Some(existing) = self.get_device_id()? {
            if !existing.trim().is_empty() {
                return Ok(existing);
            }
        }

        let device_id = uuid::Uuid::new_v4().to_string();
        self.set_device_id(&device_id)?;
        info!(device_id = %device_id, "Generated new device id");
        Ok(device_id)
    }
}
