//! Signed session tokens.
//!
//! A token has the form `<signature>,<payload>`:
//!
//! - `payload` is the base64url (padded) encoding of the compact JSON of an
//!   [`Identity`]
//! - `signature` is the base64url (padded) encoding of HMAC-SHA256 over the
//!   *encoded* payload bytes
//!
//! There is no timestamp in the token; expiry is enforced by the cookie
//! lifetime only.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::{Identity, SecretKey};

type HmacSha256 = Hmac<Sha256>;

/// Separator between signature and payload
pub const SEPARATOR: char = ',';

/// Token encoding/decoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Token is not `<signature>,<payload>`
    #[error("malformed session token")]
    Malformed,

    /// Signature is not valid base64 or does not match the payload
    #[error("invalid session token signature")]
    BadSignature,

    /// Signature matched but the payload could not be decoded
    #[error("invalid session token payload: {0}")]
    Payload(String),
}

impl TokenError {
    /// Whether this is an authenticity failure rather than a payload problem
    #[must_use]
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::Malformed | Self::BadSignature)
    }
}

/// Encode an identity into a signed token
pub fn encode(identity: &Identity, key: &SecretKey) -> Result<String, TokenError> {
    let json = serde_json::to_vec(identity).map_err(|e| TokenError::Payload(e.to_string()))?;
    let payload = URL_SAFE.encode(json);
    let signature = URL_SAFE.encode(sign(key, payload.as_bytes())?);
    Ok(format!("{signature}{SEPARATOR}{payload}"))
}

/// Verify and decode a token
pub fn decode(token: &str, key: &SecretKey) -> Result<Identity, TokenError> {
    let (signature, payload) = token.split_once(SEPARATOR).ok_or(TokenError::Malformed)?;

    if !valid_signature(key, signature, payload) {
        return Err(TokenError::BadSignature);
    }

    let json = URL_SAFE
        .decode(payload)
        .map_err(|e| TokenError::Payload(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Cheap structural check, done before any cache lookup or HMAC work
#[must_use]
pub fn looks_like_token(token: &str) -> bool {
    !token.is_empty() && token.contains(SEPARATOR)
}

/// Compare an expected MAC with a provided one.
///
/// Differing lengths are rejected immediately; equal lengths are compared
/// over every byte without an early exit.
#[must_use]
pub fn signatures_match(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected.ct_eq(provided).into()
}

fn sign(key: &SecretKey, message: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn valid_signature(key: &SecretKey, signature: &str, payload: &str) -> bool {
    let Ok(provided) = URL_SAFE.decode(signature) else {
        return false;
    };
    let Ok(expected) = sign(key, payload.as_bytes()) else {
        return false;
    };
    signatures_match(&expected, &provided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(seed: u8) -> SecretKey {
        SecretKey::from_bytes(vec![seed; 64])
    }

    fn identities() -> Vec<Identity> {
        vec![
            Identity::new("alice@org.com", "Alice Liddell", "https://example.com/a.png"),
            Identity::new("bob@org.com", "", ""),
            Identity::new("zoë@org.com", "Zoë, \"the\" Admin", "https://example.com/z?x=1&y=2"),
            Identity::new("", "", ""),
        ]
    }

    #[test]
    fn round_trip() {
        let k = key(7);
        for identity in identities() {
            let token = encode(&identity, &k).unwrap();
            assert_eq!(decode(&token, &k).unwrap(), identity);
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let k = key(7);
        let identity = &identities()[0];
        assert_eq!(encode(identity, &k).unwrap(), encode(identity, &k).unwrap());
    }

    #[test]
    fn token_shape() {
        let token = encode(&identities()[0], &key(1)).unwrap();
        let (signature, payload) = token.split_once(',').unwrap();
        // 32-byte MAC -> 44 padded base64 chars
        assert_eq!(signature.len(), 44);
        assert!(!payload.contains(','));
        assert!(looks_like_token(&token));
    }

    #[test]
    fn tampering_any_byte_is_detected() {
        let k = key(3);
        let token = encode(&identities()[0], &k).unwrap();
        let bytes = token.as_bytes();

        for i in 0..bytes.len() {
            let mut tampered = bytes.to_vec();
            tampered[i] ^= 0x01;
            let tampered = String::from_utf8(tampered).unwrap();
            for candidate in [key(3), key(4)] {
                assert!(
                    decode(&tampered, &candidate).is_err(),
                    "flipping byte {i} was not detected"
                );
            }
        }
    }

    #[test]
    fn key_isolation() {
        let identity = &identities()[0];
        let token = encode(identity, &key(1)).unwrap();
        assert_eq!(decode(&token, &key(2)), Err(TokenError::BadSignature));
        assert_eq!(
            decode(&token, &SecretKey::generate()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn malformed_tokens_fail_without_panicking() {
        let k = key(1);
        for token in ["", ",", "no-separator", "!!!,???", "abc,", ",abc"] {
            let err = decode(token, &k).unwrap_err();
            assert!(err.is_invalid_token(), "{token:?} -> {err:?}");
        }
        assert_eq!(decode("", &k), Err(TokenError::Malformed));
        assert!(!looks_like_token(""));
        assert!(!looks_like_token("abc"));
    }

    #[test]
    fn splits_on_first_separator_only() {
        let k = key(1);
        let token = encode(&identities()[0], &k).unwrap();
        let extended = format!("{token},extra");
        // The payload now contains a comma, so the MAC no longer matches.
        assert_eq!(decode(&extended, &k), Err(TokenError::BadSignature));
    }

    #[test]
    fn payload_errors_are_distinct() {
        let k = key(9);
        let payload = URL_SAFE.encode(b"not json");
        let signature = URL_SAFE.encode(sign(&k, payload.as_bytes()).unwrap());
        let err = decode(&format!("{signature},{payload}"), &k).unwrap_err();
        assert!(matches!(err, TokenError::Payload(_)));
        assert!(!err.is_invalid_token());
    }

    #[test]
    fn signature_comparison() {
        assert!(signatures_match(b"abcd", b"abcd"));
        assert!(!signatures_match(b"abcd", b"abc"));
        assert!(!signatures_match(b"abc", b"abcd"));
        assert!(!signatures_match(b"abcd", b"abce"));
        assert!(!signatures_match(b"xbcd", b"abcd"));
        assert!(signatures_match(b"", b""));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let k = key(5);
        let token = encode(&identities()[1], &k).unwrap();
        let (signature, payload) = token.split_once(',').unwrap();
        let short = URL_SAFE.encode(&URL_SAFE.decode(signature).unwrap()[..31]);
        assert_eq!(
            decode(&format!("{short},{payload}"), &k),
            Err(TokenError::BadSignature)
        );
    }
}
