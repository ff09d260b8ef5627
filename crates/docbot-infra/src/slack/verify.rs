//! Slack request signature verification.
//!
//! Slack signs every request with `v0=` + hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}` keyed by the app's signing secret. Requests
//! older than [`MAX_REQUEST_AGE_SECS`] are rejected to stop replays.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum clock distance between Slack's timestamp and ours.
pub const MAX_REQUEST_AGE_SECS: u64 = 5 * 60;

const VERSION: &str = "v0";

/// Errors that can occur while verifying a Slack request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("request timestamp is not a number")]
    MalformedTimestamp,

    #[error("request timestamp is {age_secs}s away from now")]
    StaleTimestamp { age_secs: u64 },

    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

/// Verify the `X-Slack-Signature` of a request.
///
/// `now_unix` is passed in so callers (and tests) control the clock.
pub fn verify_slack_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
    signature: &str,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let sent_at: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::MalformedTimestamp)?;
    // The header is unauthenticated until the MAC check; never overflow on it.
    let age_secs = now_unix.abs_diff(sent_at);
    if age_secs > MAX_REQUEST_AGE_SECS {
        return Err(SignatureError::StaleTimestamp { age_secs });
    }

    let hex_sig = signature
        .strip_prefix("v0=")
        .ok_or(SignatureError::VerificationFailed)?;
    let expected = hex_decode(hex_sig).ok_or(SignatureError::VerificationFailed)?;

    let mut mac = signing_mac(secret, timestamp, body)?;
    // Constant-time comparison via the hmac crate.
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::VerificationFailed)?;
    Ok(())
}

/// Compute the `v0=` signature Slack would send for this request.
pub fn compute_slack_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
) -> Result<String, SignatureError> {
    let mac = signing_mac(secret, timestamp, body)?;
    Ok(format!("{VERSION}={}", hex_encode(&mac.finalize().into_bytes())))
}

fn signing_mac(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.trim().as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
