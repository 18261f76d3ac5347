//! PayMongo webhook signature verification and event parsing.
//!
//! Signature header format: `t=<timestamp>,te=<test_sig>,li=<live_sig>`.
//! The signature is HMAC-SHA256 over `"{t}.{body}"`, hex-encoded; either
//! the test or the live signature may match.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a webhook payload against the `Paymongo-Signature` header.
///
/// Returns false for a missing/malformed header or a signature mismatch.
#[must_use]
pub fn verify_signature(body: &str, signature_header: Option<&str>, secret: &str) -> bool {
    let Some(header) = signature_header else {
        return false;
    };

    let mut timestamp = None;
    let mut test_signature = None;
    let mut live_signature = None;
    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", v)) => timestamp = Some(v),
            Some(("te", v)) => test_signature = Some(v),
            Some(("li", v)) => live_signature = Some(v),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    let Some(expected) = test_signature.or(live_signature) else {
        return false;
    };
    let Some(expected_bytes) = decode_hex(expected) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{timestamp}.{body}").as_bytes());

    // verify_slice performs a constant-time comparison.
    mac.verify_slice(&expected_bytes).is_ok()
}

/// Extracts the paid link id from a `link.payment.paid` event body.
///
/// Returns `None` for any other event type or a payload without the
/// `metadata.link_id` field.
#[must_use]
pub fn paid_link_id(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let attributes = &value["data"]["attributes"];

    if attributes["type"].as_str()? != "link.payment.paid" {
        return None;
    }

    attributes["data"]["attributes"]["metadata"]["link_id"]
        .as_str()
        .map(ToString::to_string)
}

/// Decodes a lowercase/uppercase hex string into bytes.
fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Produces a header the way PayMongo signs payloads, for round-trip
    /// verification in tests.
    fn sign(body: &str, timestamp: &str, secret: &str, key: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{body}").as_bytes());
        let hex: String = mac
            .finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        format!("t={timestamp},{key}={hex}")
    }

    const BODY: &str = r#"{"data":{"attributes":{"type":"link.payment.paid"}}}"#;
    const SECRET: &str = "whsk_test_secret";

    #[test]
    fn test_valid_test_signature_accepted() {
        let header = sign(BODY, "1722470400", SECRET, "te");
        assert!(verify_signature(BODY, Some(&header), SECRET));
    }

    #[test]
    fn test_valid_live_signature_accepted() {
        let header = sign(BODY, "1722470400", SECRET, "li");
        assert!(verify_signature(BODY, Some(&header), SECRET));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let header = sign(BODY, "1722470400", SECRET, "te");
        assert!(!verify_signature("{}", Some(&header), SECRET));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = sign(BODY, "1722470400", SECRET, "te");
        assert!(!verify_signature(BODY, Some(&header), "whsk_other"));
    }

    #[test]
    fn test_missing_header_rejected() {
        assert!(!verify_signature(BODY, None, SECRET));
    }

    #[test]
    fn test_malformed_header_rejected() {
        assert!(!verify_signature(BODY, Some("garbage"), SECRET));
        assert!(!verify_signature(BODY, Some("t=123"), SECRET));
        assert!(!verify_signature(BODY, Some("te=zz"), SECRET));
    }

    #[test]
    fn test_paid_link_id_extracted() {
        let body = r#"{
            "data": {
                "attributes": {
                    "type": "link.payment.paid",
                    "data": {
                        "attributes": {
                            "metadata": { "link_id": "link_abc123" }
                        }
                    }
                }
            }
        }"#;
        assert_eq!(paid_link_id(body).as_deref(), Some("link_abc123"));
    }

    #[test]
    fn test_other_event_types_ignored() {
        let body = r#"{
            "data": {
                "attributes": {
                    "type": "link.payment.failed",
                    "data": {
                        "attributes": { "metadata": { "link_id": "link_abc123" } }
                    }
                }
            }
        }"#;
        assert_eq!(paid_link_id(body), None);
    }

    #[test]
    fn test_missing_metadata_ignored() {
        let body = r#"{"data":{"attributes":{"type":"link.payment.paid","data":{"attributes":{}}}}}"#;
        assert_eq!(paid_link_id(body), None);
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("00ff"), Some(vec![0x00, 0xff]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
        assert_eq!(decode_hex(""), Some(vec![]));
    }
}
