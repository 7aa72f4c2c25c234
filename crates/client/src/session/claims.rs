//! Bearer token claim decoding.
//!
//! The backend issues JWTs carrying `sub` (username), `role`, and `exp`.
//! The payload is read for display only: the signature is NOT verified here.
//! The backend verifies the token on every protected request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use honor_loyalty_core::{StaffIdentity, StaffRole};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while reading a token payload.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token does not have the `header.payload.signature` shape.
    #[error("token is not a JWT")]
    NotAJwt,

    /// The payload segment is not valid base64url.
    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload is not the expected JSON object.
    #[error("payload is not valid claims JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RawClaims {
    sub: String,
    role: StaffRole,
    #[serde(default)]
    exp: Option<i64>,
}

/// Claims decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub identity: StaffIdentity,
    /// Expiry advertised by the token, if any. Informational only.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Decode the payload of a JWT without verifying it.
///
/// # Errors
///
/// Returns [`ClaimsError`] if the token is not a three-part JWT or its payload
/// is not a JSON object with `sub` and `role`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) if !payload.is_empty() => payload,
        _ => return Err(ClaimsError::NotAJwt),
    };

    // Some encoders keep the padding; base64url in JWTs normally drops it
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let raw: RawClaims = serde_json::from_slice(&bytes)?;

    Ok(TokenClaims {
        identity: StaffIdentity {
            username: raw.sub,
            role: raw.role,
        },
        expires_at: raw.exp.and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}

/// Build an unsigned JWT carrying the given claims.
///
/// Only useful for tests and local mock backends.
#[must_use]
pub fn encode_unsigned(username: &str, role: StaffRole, exp: Option<i64>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let mut claims = serde_json::json!({ "sub": username, "role": role });
    if let Some(exp) = exp {
        claims["exp"] = serde_json::json!(exp);
    }
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.unsigned")
}
