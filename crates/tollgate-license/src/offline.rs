//! Offline token wire format.
//!
//! A token is base64 (standard alphabet) of `{"data": "<json>", "checksum":
//! "<hex>"}`, where `data` is the JSON-encoded [`OfflineToken`] and the
//! checksum is blake3 over `data` followed by the key material. The checksum
//! only proves the issuer held the same key material.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use tollgate_core::errors::LicenseError;
use tollgate_core::models::{OfflineToken, TokenEnvelope};

/// Keyed checksum of a token payload, lowercase hex.
pub fn checksum(data: &str, key_material: &str) -> String {
    compute(data, key_material).to_hex().to_string()
}

fn compute(data: &str, key_material: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data.as_bytes());
    hasher.update(key_material.as_bytes());
    hasher.finalize()
}

/// Serialize, checksum, and wrap a token.
pub fn encode(token: &OfflineToken, key_material: &str) -> Result<String, LicenseError> {
    let data = serde_json::to_string(token).map_err(|_| LicenseError::InvalidTokenFormat)?;
    let envelope = TokenEnvelope {
        checksum: checksum(&data, key_material),
        data,
    };
    let json = serde_json::to_vec(&envelope).map_err(|_| LicenseError::InvalidTokenFormat)?;
    Ok(STANDARD.encode(json))
}

/// Unwrap a token and verify its checksum before parsing the payload.
///
/// Expiry and extension binding are checked by the caller.
pub fn decode(token: &str, key_material: &str) -> Result<OfflineToken, LicenseError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| LicenseError::InvalidTokenFormat)?;
    let envelope: TokenEnvelope =
        serde_json::from_slice(&bytes).map_err(|_| LicenseError::InvalidTokenFormat)?;

    let presented =
        blake3::Hash::from_hex(&envelope.checksum).map_err(|_| LicenseError::IntegrityCheckFailed)?;
    // blake3::Hash equality is constant-time.
    if presented != compute(&envelope.data, key_material) {
        return Err(LicenseError::IntegrityCheckFailed);
    }

    serde_json::from_str(&envelope.data).map_err(|_| LicenseError::InvalidTokenFormat)
}
