use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha256;

use super::error::SumsubError;

type HmacSha256 = Hmac<Sha256>;

/// Current Unix timestamp in seconds, as sent in `X-App-Access-Ts`.
///
/// Generated per request; the provider rejects timestamps outside its own
/// tolerance window so the value must never be cached.
#[must_use]
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Computes the `X-App-Access-Sig` value for a provider request.
///
/// HMAC-SHA256 keyed with `secret` over `timestamp || method || path || body`,
/// lowercase hex encoded. `path` includes the query string and excludes the
/// host. A request without a body contributes nothing after the path.
///
/// # Errors
///
/// Returns `SumsubError::Signing` if the secret cannot be used as an HMAC key
pub fn sign_request(
    secret: &str,
    timestamp: i64,
    method: &Method,
    path: &str,
    body: Option<&[u8]>,
) -> Result<String, SumsubError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SumsubError::Signing(e.to_string()))?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(method.as_str().as_bytes());
    mac.update(path.as_bytes());
    if let Some(body) = body {
        mac.update(body);
    }

    Ok(hex::encode(mac.finalize().into_bytes()))
}
