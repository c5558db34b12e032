use crate::IdentityError;
use alloy_primitives::Address;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;

const PRIVATE_KEY_LEN: usize = 32;

/// Parse a 32-byte secp256k1 private key from hex (optional `0x` prefix).
pub fn parse_private_key_hex(input: &str) -> Result<SecretKey, IdentityError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != PRIVATE_KEY_LEN * 2 {
        return Err(IdentityError::InvalidPrivateKey {
            message: format!(
                "expected {} hex characters, got {}",
                PRIVATE_KEY_LEN * 2,
                digits.len()
            ),
        });
    }

    let bytes = hex::decode(digits).map_err(|err| IdentityError::InvalidPrivateKey {
        message: err.to_string(),
    })?;

    SecretKey::from_slice(&bytes).map_err(|_| IdentityError::InvalidPrivateKey {
        message: "value is not a valid secp256k1 scalar".to_string(),
    })
}

/// EIP-55 checksummed Ethereum address for `key`.
pub fn derive_creator_address(key: &SecretKey) -> String {
    let point = key.public_key().to_encoded_point(false);
    // Uncompressed SEC1 points are 0x04 || X || Y; the address hashes X || Y.
    Address::from_raw_public_key(&point.as_bytes()[1..]).to_checksum(None)
}
