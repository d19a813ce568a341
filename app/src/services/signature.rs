// app/src/services/signature.rs

//! Webhook signature verification.
//!
//! The payment provider signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` and sends the result in a header of the form
//! `t=<unix_seconds>,v1=<hex_digest>`. When a signing secret is configured
//! the header must verify before any event state is touched.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("signature header missing")]
  MissingHeader,
  #[error("malformed signature header")]
  MalformedHeader,
  #[error("signature mismatch")]
  Mismatch,
}

/// Computes the signature header value for a payload. Used by the provider
/// side of tests and by operators replaying events.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
  mac.update(format!("{}.", timestamp).as_bytes());
  mac.update(payload);
  format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a signature header against the raw payload. Comparison is
/// constant-time via the HMAC verify primitive.
pub fn verify(secret: &str, header: Option<&str>, payload: &[u8]) -> Result<(), SignatureError> {
  let header = header.ok_or(SignatureError::MissingHeader)?;

  let mut timestamp: Option<i64> = None;
  let mut provided_hex: Option<&str> = None;
  for part in header.split(',') {
    match part.split_once('=') {
      Some(("t", value)) => timestamp = value.parse().ok(),
      Some(("v1", value)) => provided_hex = Some(value),
      _ => {}
    }
  }
  let (timestamp, provided_hex) = match (timestamp, provided_hex) {
    (Some(t), Some(v)) => (t, v),
    _ => return Err(SignatureError::MalformedHeader),
  };
  let provided = hex::decode(provided_hex).map_err(|_| SignatureError::MalformedHeader)?;

  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
  mac.update(format!("{}.", timestamp).as_bytes());
  mac.update(payload);
  mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "whsec_test_secret";
  const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"charge.succeeded"}"#;

  #[test]
  fn signed_header_verifies() {
    let header = sign(SECRET, 1_700_000_000, PAYLOAD);
    assert_eq!(verify(SECRET, Some(&header), PAYLOAD), Ok(()));
  }

  #[test]
  fn missing_header_is_rejected() {
    assert_eq!(verify(SECRET, None, PAYLOAD), Err(SignatureError::MissingHeader));
  }

  #[test]
  fn tampered_payload_is_rejected() {
    let header = sign(SECRET, 1_700_000_000, PAYLOAD);
    assert_eq!(
      verify(SECRET, Some(&header), br#"{"id":"evt_1","type":"charge.failed"}"#),
      Err(SignatureError::Mismatch)
    );
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let header = sign("whsec_other", 1_700_000_000, PAYLOAD);
    assert_eq!(verify(SECRET, Some(&header), PAYLOAD), Err(SignatureError::Mismatch));
  }

  #[test]
  fn garbage_header_is_malformed() {
    assert_eq!(
      verify(SECRET, Some("not-a-signature"), PAYLOAD),
      Err(SignatureError::MalformedHeader)
    );
    assert_eq!(
      verify(SECRET, Some("t=abc,v1=zz"), PAYLOAD),
      Err(SignatureError::MalformedHeader)
    );
  }
}
