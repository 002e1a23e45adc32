use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Base64-encoded HMAC-SHA256 of `payload` keyed with `secret`.
pub fn compute_webhook_signature(payload: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check that a webhook body was signed with the shared secret.
///
/// With no secret configured every delivery is accepted (development mode).
/// With a secret, a missing signature fails, and a present one is compared to
/// the expected value in constant time.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(signature) = signature else {
        return false;
    };
    let Some(expected) = compute_webhook_signature(payload, secret) else {
        return false;
    };

    let expected_bytes = expected.as_bytes();
    let provided_bytes = signature.trim().as_bytes();

    // Length is not secret: a SHA-256 digest is always 44 base64 chars
    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}
