//! Secure storage for the Parity gateway.
//!
//! Secrets (the operator's signing key and the device id) live in an
//! encrypted file keystore under `~/.parity/keystore`. [`SecretsManager`] is
//! the typed entry point; [`SecureStorage`] lets tests swap the backend.

mod file_keystore;
mod keys;
mod secrets;
mod traits;

pub use file_keystore::FileKeystore;
pub use keys::StorageKeys;
pub use secrets::SecretsManager;
pub use traits::SecureStorage;

use gateway_config_and_utils::Paths;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Platform storage error: {0}")]
    Platform(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Keystore contents exist but cannot be read back.
    #[error("Keystore corrupted: {0}")]
    Corrupted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Open the file keystore under the gateway base directory.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn SecureStorage>> {
    let storage = FileKeystore::open(&paths.keystore_dir())?;
    Ok(Box::new(storage))
}

/// Create a SecretsManager backed by the default keystore.
pub fn create_secrets_manager(paths: &Paths) -> StorageResult<SecretsManager> {
    Ok(SecretsManager::new(create_storage(paths)?))
}
