//! Inbound provider callbacks.
//!
//! A callback is verified against its raw body first; only then is it decoded
//! and dispatched into the [`ReviewStore`].

pub mod dispatcher;
pub mod payload;
pub mod verifier;

use thiserror::Error;

pub use dispatcher::{DispatchOutcome, ReviewRecord, ReviewState, ReviewStore};
pub use payload::WebhookPayload;
pub use verifier::{
    compute_payload_digest, verify_payload_digest, CallbackEnvelope, HMAC_SHA256_HEX,
    PAYLOAD_DIGEST_ALG_HEADER, PAYLOAD_DIGEST_HEADER,
};

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing, unsupported or mismatching payload digest
    #[error("Callback digest verification failed")]
    VerificationFailed,

    /// The body was authentic but is not valid JSON
    #[error("Invalid callback payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Verifies, decodes and dispatches one callback.
///
/// Nothing in the body is parsed before the digest has been checked.
///
/// # Errors
///
/// - `WebhookError::VerificationFailed` - The digest did not authenticate the body
/// - `WebhookError::InvalidPayload` - The authenticated body is not JSON
pub async fn process_callback(
    store: &ReviewStore,
    secret: &str,
    envelope: &CallbackEnvelope<'_>,
) -> Result<DispatchOutcome, WebhookError> {
    if !envelope.verify(secret) {
        return Err(WebhookError::VerificationFailed);
    }

    let payload = WebhookPayload::from_slice(envelope.body)?;
    let outcome = store.dispatch(&payload).await;

    match &outcome {
        DispatchOutcome::Transitioned {
            applicant_id,
            from,
            to,
        } => tracing::info!("Applicant {applicant_id} review state {from:?} -> {to:?}"),
        DispatchOutcome::Stale {
            applicant_id,
            current,
            reported,
        } => tracing::warn!(
            "Ignoring stale callback for applicant {applicant_id}: reported {reported:?}, current {current:?}"
        ),
        DispatchOutcome::Unchanged { applicant_id, .. } => {
            tracing::debug!("Duplicate callback for applicant {applicant_id}");
        }
        DispatchOutcome::NoReview { applicant_id } => {
            tracing::debug!("Callback for applicant {applicant_id} carries no review");
        }
        DispatchOutcome::Ignored => tracing::debug!("Callback without applicant id ignored"),
    }

    Ok(outcome)
}
