//! Webhook challenge and payload verification.
//!
//! Smartcar signs webhook deliveries with `HMAC-SHA256(amt, payload)` and
//! sends the hex digest in the `sc-signature` header. The same digest
//! answers the initial verification challenge.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex digest of `HMAC-SHA256(amt, challenge)`, used to answer a webhook
/// verification challenge.
pub fn hash_challenge(amt: &str, challenge: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(amt.as_bytes()).expect("HMAC accepts any key length");
    mac.update(challenge.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a webhook delivery: the digest of the JSON-stringified payload
/// keyed by the application management token must equal the
/// `sc-signature` header value.
pub fn verify_payload(amt: &str, signature: &str, payload: &serde_json::Value) -> bool {
    hash_challenge(amt, &payload.to_string()) == signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_hex_sha256_sized() {
        let digest = hash_challenge("amt-token", "challenge-string");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_is_deterministic_per_key() {
        let first = hash_challenge("amt-token", "challenge-string");
        let second = hash_challenge("amt-token", "challenge-string");
        let other_key = hash_challenge("other-token", "challenge-string");
        assert_eq!(first, second);
        assert_ne!(first, other_key);
    }

    #[test]
    fn payload_round_trips_through_verification() {
        let payload = json!({"eventName": "verify", "payload": {"challenge": "x"}});
        let signature = hash_challenge("amt-token", &payload.to_string());
        assert!(verify_payload("amt-token", &signature, &payload));
        assert!(!verify_payload("amt-token", "deadbeef", &payload));
        assert!(!verify_payload("wrong-token", &signature, &payload));
    }
}
