//! Bybit request signing.
//!
//! Bybit v5 uses HMAC-SHA256 with the API secret in two places:
//!
//! 1. **REST**: `X-BAPI-SIGN` over `timestamp + api_key + recv_window + payload`,
//!    where `payload` is the query string for GET requests.
//! 2. **Private WebSocket**: the `auth` op signs `"GET/realtime" + expires`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA256 signature and return it as a lowercase hex string.
pub fn hmac_sha256_sign(secret: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signature for the `X-BAPI-SIGN` header of a REST request.
pub fn rest_signature(secret: &str, timestamp_ms: u64, api_key: &str, recv_window_ms: u64, payload: &str) -> String {
    hmac_sha256_sign(secret, &format!("{timestamp_ms}{api_key}{recv_window_ms}{payload}"))
}

/// Build a URL-encoded query string, keeping parameter order (the signature
/// covers the exact string that is sent).
pub fn build_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// The `auth` op for the private stream, valid until `expires_ms`.
pub fn ws_auth_message(api_key: &str, secret: &str, expires_ms: u64) -> String {
    let signature = hmac_sha256_sign(secret, &format!("GET/realtime{expires_ms}"));
    serde_json::json!({
        "op": "auth",
        "args": [api_key, expires_ms, signature],
    })
    .to_string()
}
