//! Identity derivation from the stored token.
//!
//! The token is a JWT whose claims we read locally; the signature is the
//! backend's business, not ours. A malformed token simply yields no
//! identity, which callers treat as logged out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Read-only projection of the token's claims. Recomputed on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default, alias = "user_id")]
    uid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Decode the claims segment of a JWT without verifying the signature.
///
/// Returns `None` on any decode failure or when no user id claim is present.
pub fn decode_identity(token: &str) -> Option<UserIdentity> {
    let mut parts = token.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    let uid = claims.uid.or(claims.sub)?;
    Some(UserIdentity {
        uid,
        email: claims.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_jwt(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
        format!("{header}.{payload}.fakesig")
    }

    #[test]
    fn test_decodes_user_id_and_email() {
        let token = fake_jwt(&serde_json::json!({
            "user_id": "u123",
            "email": "someone@example.com",
            "iat": 1_700_000_000,
        }));
        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.uid, "u123");
        assert_eq!(identity.email.as_deref(), Some("someone@example.com"));
    }

    #[test]
    fn test_falls_back_to_sub() {
        let token = fake_jwt(&serde_json::json!({ "sub": "u456" }));
        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.uid, "u456");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn test_garbage_yields_none() {
        assert_eq!(decode_identity("not-a-jwt"), None);
        assert_eq!(decode_identity(""), None);
        assert_eq!(decode_identity("a.!!!notbase64!!!.c"), None);
    }

    #[test]
    fn test_missing_uid_claim_yields_none() {
        let token = fake_jwt(&serde_json::json!({ "email": "x@example.com" }));
        assert_eq!(decode_identity(&token), None);
    }
}
