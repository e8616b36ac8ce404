//! Webhook signature verification.
//!
//! The gateway signs every delivery with the shared webhook secret: the `Stripe-Signature` header carries a
//! timestamp element (`t=…`) and one or more hex-encoded HMAC-SHA256 signatures (`v1=…`) computed over
//! `"{timestamp}.{raw body}"`. Verification is a pure computation over the exact bytes that arrived; callers
//! must hand the unparsed request body in, never a re-serialized form.
use cps_common::Secret;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::data_objects::StripeEvent;

type HmacSha256 = Hmac<Sha256>;

/// The request header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("The signature header is malformed. {0}")]
    MalformedSignatureHeader(String),
    #[error("The payload signature does not match the signature header")]
    InvalidSignature,
    #[error("The payload is not a valid event. {0}")]
    MalformedPayload(String),
}

struct SignatureHeader {
    timestamp: String,
    v1: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut v1 = Vec::new();
    for element in header.split(',') {
        let mut parts = element.trim().splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("t"), Some(value)) => timestamp = Some(value.to_string()),
            (Some("v1"), Some(value)) => v1.push(value.to_string()),
            // Signature schemes other than v1 are ignored
            _ => {},
        }
    }
    let timestamp = timestamp
        .ok_or_else(|| WebhookError::MalformedSignatureHeader("no timestamp element".to_string()))?;
    if v1.is_empty() {
        return Err(WebhookError::MalformedSignatureHeader("no v1 signature element".to_string()));
    }
    Ok(SignatureHeader { timestamp, v1 })
}

/// Verifies the signature over the raw payload bytes and parses the event.
///
/// Any of the `v1` signatures in the header may match (the gateway sends several while a secret is being
/// rolled). The HMAC comparison is constant-time. A payload that fails verification is rejected before any
/// parsing happens.
pub fn verify_webhook_payload(
    payload: &[u8],
    signature_header: &str,
    secret: &Secret<String>,
) -> Result<StripeEvent, WebhookError> {
    let header = parse_signature_header(signature_header)?;
    let verified = header.v1.iter().any(|signature| {
        hex::decode(signature)
            .map(|bytes| signed_payload_mac(payload, &header.timestamp, secret).verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !verified {
        return Err(WebhookError::InvalidSignature);
    }
    serde_json::from_slice(payload).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
}

/// Produces a signature header for a payload: the inverse of [`verify_webhook_payload`]. Used by tooling and
/// tests to construct deliveries the verifier accepts.
pub fn sign_payload(payload: &[u8], timestamp: &str, secret: &Secret<String>) -> String {
    let mac = signed_payload_mac(payload, timestamp, secret);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

fn signed_payload_mac(payload: &[u8], timestamp: &str, secret: &Secret<String>) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.reveal().as_bytes()).expect("HMAC can take a key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}
