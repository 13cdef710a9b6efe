use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    Extension,
};
use tracing::instrument;

use crate::{
    types::{AppError, SumsubConfig},
    webhook::{
        process_callback, CallbackEnvelope, ReviewStore, PAYLOAD_DIGEST_ALG_HEADER,
        PAYLOAD_DIGEST_HEADER,
    },
};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Receives review callbacks from Sumsub
///
/// The raw body is authenticated with `X-Payload-Digest` before anything in
/// it is decoded. Verified payloads are acknowledged with 200 whether or not
/// they reference an applicant.
///
/// # Errors
///
/// - 401 - Missing or mismatching digest, or an unsupported digest algorithm
/// - 400 - Authentic body that is not JSON
#[instrument(skip_all)]
pub async fn verify(
    Extension(config): Extension<Arc<SumsubConfig>>,
    Extension(store): Extension<Arc<ReviewStore>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let envelope = CallbackEnvelope {
        body: &body,
        digest: header(&headers, PAYLOAD_DIGEST_HEADER),
        digest_alg: header(&headers, PAYLOAD_DIGEST_ALG_HEADER),
    };

    process_callback(&store, config.webhook_secret(), &envelope)
        .await
        .inspect_err(|e| tracing::warn!("Webhook rejected: {e}"))?;

    Ok(StatusCode::OK)
}
