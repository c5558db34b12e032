//! # Device Identity Crypto
//!
//! Resolves the gateway's identity from the local keystore: the stable
//! device id and the creator address derived from the operator's
//! secp256k1 signing key. Both values are stamped onto every request the
//! gateway sends to the runner.

mod address;
mod error;

pub use address::{derive_creator_address, parse_private_key_hex};
pub use error::IdentityError;

use gateway_storage::SecretsManager;
use serde::Serialize;
use tracing::info;

/// Identity resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub device_id: String,
    pub creator_address: String,
}

/// Load the signing key and device id, creating the device id if this is
/// the first run. Fails with [`IdentityError::NotAuthenticated`] when no key
/// has been imported.
pub fn resolve_identity(secrets: &SecretsManager) -> Result<Identity, IdentityError> {
    let key_hex = secrets
        .get_private_key_hex()?
        .ok_or(IdentityError::NotAuthenticated)?;
    let key = parse_private_key_hex(&key_hex)?;
    let creator_address = derive_creator_address(&key);

    let device_id = secrets.ensure_device_id()?;

    info!(
        device_id = %device_id,
        creator_address = %creator_address,
        "Identity resolved"
    );

    Ok(Identity {
        device_id,
        creator_address,
    })
}

/// Validate `private_key_hex`, store it, and return the identity it yields.
pub fn import_private_key(
    secrets: &SecretsManager,
    private_key_hex: &str,
) -> Result<Identity, IdentityError> {
    parse_private_key_hex(private_key_hex)?;
    secrets.set_private_key_hex(private_key_hex)?;
    resolve_identity(secrets)
}
