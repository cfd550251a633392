//! Process-wide signing key.

use std::fmt;

use rand::RngExt;

/// Length of a generated key in bytes
pub const KEY_LEN: usize = 64;

/// HMAC key used to sign and verify session tokens.
///
/// Generated once at startup and never persisted, so every restart
/// invalidates all outstanding sessions.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Generate a fresh random key
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = Vec::with_capacity(KEY_LEN);
        while bytes.len() < KEY_LEN {
            let chunk: [u8; 32] = rng.random();
            bytes.extend_from_slice(&chunk);
        }
        bytes.truncate(KEY_LEN);
        Self(bytes)
    }

    /// Wrap existing key material
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw key bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}
