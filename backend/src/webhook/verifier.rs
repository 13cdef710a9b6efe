use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const PAYLOAD_DIGEST_HEADER: &str = "X-Payload-Digest";
pub const PAYLOAD_DIGEST_ALG_HEADER: &str = "X-Payload-Digest-Alg";

/// The only digest algorithm accepted on callbacks
pub const HMAC_SHA256_HEX: &str = "HMAC_SHA256_HEX";

/// Raw inbound callback as received, before anything is trusted
#[derive(Debug, Clone, Copy)]
pub struct CallbackEnvelope<'a> {
    pub body: &'a [u8],
    pub digest: Option<&'a str>,
    pub digest_alg: Option<&'a str>,
}

impl CallbackEnvelope<'_> {
    /// See [`verify_payload_digest`]
    #[must_use]
    pub fn verify(&self, secret: &str) -> bool {
        verify_payload_digest(self.body, self.digest, self.digest_alg, secret)
    }
}

/// Lowercase hex HMAC-SHA256 of `body` keyed with `secret`.
///
/// Returns `None` for an empty secret.
#[must_use]
pub fn compute_payload_digest(body: &[u8], secret: &str) -> Option<String> {
    if secret.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Authenticates a callback body against its `X-Payload-Digest` header.
///
/// Fails closed: a missing header, an algorithm other than
/// `HMAC_SHA256_HEX`, an empty secret or a digest that is not exactly the
/// lowercase hex HMAC of the raw body all yield `false`. The comparison of the
/// MAC itself is constant time.
#[must_use]
pub fn verify_payload_digest(
    body: &[u8],
    digest: Option<&str>,
    digest_alg: Option<&str>,
    secret: &str,
) -> bool {
    if digest_alg != Some(HMAC_SHA256_HEX) || secret.is_empty() {
        return false;
    }
    let Some(digest) = digest else {
        return false;
    };
    if !digest
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return false;
    }
    let Ok(received) = hex::decode(digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&received).is_ok()
}
