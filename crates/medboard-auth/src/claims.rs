//! Best-effort access token expiry decoding
//!
//! Reads the `exp` claim from the token's payload segment without verifying
//! the signature. The result is used only to schedule proactive renewal,
//! never for authorization decisions.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Decode the expiry time of a JWT-shaped token.
///
/// Any malformation (wrong segment count, bad base64, bad JSON, missing
/// `exp`) yields `None` rather than an error.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_decodes_exp_claim() {
        let token = token_with_payload(r#"{"sub":"42","role":"admin","exp":1735689600}"#);
        let exp = expires_at(&token).unwrap();
        assert_eq!(exp, DateTime::from_timestamp(1_735_689_600, 0).unwrap());
    }

    #[test]
    fn test_not_a_jwt() {
        assert_eq!(expires_at(""), None);
        assert_eq!(expires_at("opaque-token"), None);
    }

    #[test]
    fn test_payload_not_base64() {
        assert_eq!(expires_at("header.!!!.signature"), None);
    }

    #[test]
    fn test_payload_not_json() {
        let token = format!("header.{}.signature", URL_SAFE_NO_PAD.encode("not json"));
        assert_eq!(expires_at(&token), None);
    }

    #[test]
    fn test_missing_exp_claim() {
        let token = token_with_payload(r#"{"sub":"42"}"#);
        assert_eq!(expires_at(&token), None);
    }
}
