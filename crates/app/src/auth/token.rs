//! API token generation and hashing.

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// API token prefix.
pub const API_TOKEN_PREFIX: &str = "bz_";

/// Number of secret bytes encoded in a token.
pub const API_TOKEN_SECRET_BYTES: usize = 32;

#[derive(Clone)]
pub struct ApiTokenSecret {
    bytes: [u8; API_TOKEN_SECRET_BYTES],
}

impl ApiTokenSecret {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; API_TOKEN_SECRET_BYTES]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; API_TOKEN_SECRET_BYTES] {
        &self.bytes
    }
}

impl fmt::Debug for ApiTokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiTokenSecret(**redacted**)")
    }
}

impl Drop for ApiTokenSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

#[must_use]
pub fn generate_api_token_secret() -> ApiTokenSecret {
    let mut secret = [0_u8; API_TOKEN_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    ApiTokenSecret::from_bytes(secret)
}

/// `bz_` followed by the hex-encoded secret.
#[must_use]
pub fn format_api_token(secret: &ApiTokenSecret) -> String {
    format!("{API_TOKEN_PREFIX}{}", hex::encode(secret.as_bytes()))
}

/// The value stored in `api_tokens.token_hash`.
#[must_use]
pub fn hash_api_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_token_carries_prefix_and_hex_secret() {
        let token = format_api_token(&ApiTokenSecret::from_bytes([0xAB; API_TOKEN_SECRET_BYTES]));

        assert_eq!(token, format!("bz_{}", "ab".repeat(API_TOKEN_SECRET_BYTES)));
    }

    #[test]
    fn generated_secrets_differ() {
        let first = generate_api_token_secret();
        let second = generate_api_token_secret();

        assert_ne!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            hash_api_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = ApiTokenSecret::from_bytes([1; API_TOKEN_SECRET_BYTES]);

        assert_eq!(format!("{secret:?}"), "ApiTokenSecret(**redacted**)");
    }
}
