//! Webhook signatures.
//!
//! The chain service signs `"{hash}:{status}:{gas_fee}:{block_number}"`
//! (absent fields are empty) with HMAC-SHA256 and sends the hex digest.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Shared webhook secret, wiped from memory on drop.
#[derive(Clone)]
pub struct WebhookSecret(Zeroizing<Vec<u8>>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        <HmacSha256 as Mac>::new_from_slice(&self.0)
            .unwrap_or_else(|_infallible| unreachable!("hmac accepts any key length"))
    }

    /// Hex-encoded HMAC-SHA256 of `message`.
    #[must_use]
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a hex signature.
    #[must_use]
    pub fn verify(&self, message: &str, signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(message.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl Debug for WebhookSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("WebhookSecret(..)")
    }
}

/// The exact text covered by a webhook signature.
#[must_use]
pub fn canonical_message(
    transaction_hash: &str,
    status: &str,
    gas_fee: Option<&str>,
    block_number: Option<i64>,
) -> String {
    let block_number = block_number.map(|block| block.to_string()).unwrap_or_default();

    format!(
        "{transaction_hash}:{status}:{}:{block_number}",
        gas_fee.unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_message_leaves_absent_fields_empty() {
        assert_eq!(
            canonical_message("abc", "confirmed", None, None),
            "abc:confirmed::"
        );
        assert_eq!(
            canonical_message("abc", "failed", Some("0.000005"), Some(42)),
            "abc:failed:0.000005:42"
        );
    }

    #[test]
    fn signature_matches_reference_hmac() {
        // RFC 4231 test case 2.
        let secret = WebhookSecret::new("Jefe");

        assert_eq!(
            secret.sign("what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_own_signature_and_rejects_tampering() {
        let secret = WebhookSecret::new("s3cret");
        let message = canonical_message("hash", "confirmed", Some("0.1"), Some(7));
        let signature = secret.sign(&message);

        assert!(secret.verify(&message, &signature));
        assert!(secret.verify(&message, &signature.to_uppercase()));
        assert!(!secret.verify(&canonical_message("hash", "failed", Some("0.1"), Some(7)), &signature));
        assert!(!WebhookSecret::new("other").verify(&message, &signature));
        assert!(!secret.verify(&message, "not-hex"));
    }

    #[test]
    fn debug_output_hides_the_secret() {
        assert_eq!(format!("{:?}", WebhookSecret::new("s3cret")), "WebhookSecret(..)");
    }
}
