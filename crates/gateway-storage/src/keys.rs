//! Storage key constants.

/// Names of the entries the gateway keeps in its keystore.
pub struct StorageKeys;

impl StorageKeys {
    /// Hex-encoded secp256k1 private key imported by `parity-gateway auth`.
    pub const PRIVATE_KEY: &'static str = "identity.private_key";

    /// Stable device identifier (UUID v4), generated on first use.
    pub const DEVICE_ID: &'static str = "identity.device_id";
}
