use gateway_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// No signing key has been imported yet.
    #[error("not authenticated: run `parity-gateway auth --private-key <hex>` first")]
    NotAuthenticated,

    #[error("invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    #[error("keystore error: {0}")]
    Storage(#[from] StorageError),
}

impl IdentityError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::InvalidPrivateKey { .. } => "invalid_private_key",
            Self::Storage(_) => "storage_error",
        }
    }
}
