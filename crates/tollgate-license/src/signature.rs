//! Structural decoding of license signatures.
//!
//! A signature is `header.payload.signature` with a base64url JSON payload.
//! Only the payload is read; the cryptographic signature is not verified.

use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Deserialize;

use tollgate_core::errors::LicenseError;

const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims read from the signature payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureClaims {
    #[serde(alias = "sub")]
    pub user_id: String,
    /// Expiry, Unix seconds.
    pub exp: i64,
    #[serde(default)]
    pub extension_id: Option<String>,
}

impl SignatureClaims {
    /// Expiry as Unix millis.
    pub fn exp_millis(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }
}

/// Decode the payload of a JWT-shaped signature.
pub fn decode_signature(token: &str) -> Result<SignatureClaims, LicenseError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(LicenseError::InvalidSignature);
    };
    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|_| LicenseError::InvalidSignature)?;
    serde_json::from_slice(&bytes).map_err(|_| LicenseError::InvalidSignature)
}
