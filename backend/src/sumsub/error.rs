use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors raised while talking to the Sumsub REST API
#[derive(Debug, Error)]
pub enum SumsubError {
    /// The request never produced a response (DNS, connection refused, timeout)
    #[error("HTTP request failed for {method} {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The provider answered with a status >= 400
    #[error("Sumsub API error: Status {status}, Body: {body}")]
    Provider { status: StatusCode, body: String },

    /// Request or response body could not be (de)serialized
    #[error("Marshal error: {0}")]
    Marshal(#[from] serde_json::Error),

    /// The document content stream could not be read
    #[error("Failed to read document content: {0}")]
    Content(#[source] std::io::Error),

    /// The secret key was rejected as HMAC key material
    #[error("Failed to sign request: {0}")]
    Signing(String),
}

impl SumsubError {
    /// Whether a caller-driven retry could plausibly succeed.
    ///
    /// Transport failures and 5xx responses are retryable; 4xx responses,
    /// marshalling and signing failures are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Provider { status, .. } => status.is_server_error(),
            Self::Marshal(_) | Self::Content(_) | Self::Signing(_) => false,
        }
    }

    /// HTTP status returned by the provider, if any
    #[must_use]
    pub const fn provider_status(&self) -> Option<StatusCode> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by the applicant lifecycle, tagged with the phase that failed
#[derive(Debug, Error)]
pub enum ApplicantError {
    /// Nothing was created at the provider
    #[error("Failed to create applicant: {0}")]
    CreationFailed(#[source] SumsubError),

    /// The applicant exists at the provider but has no document attached
    #[error("Failed to add document to applicant {applicant_id}: {source}")]
    AttachmentFailed {
        applicant_id: String,
        #[source]
        source: SumsubError,
    },

    #[error("Failed to get applicant {applicant_id}: {source}")]
    LookupFailed {
        applicant_id: String,
        #[source]
        source: SumsubError,
    },

    #[error("Failed to generate access token: {0}")]
    AccessTokenFailed(#[source] SumsubError),

    /// Attachment was requested for an applicant the provider never acknowledged
    #[error("Applicant has no provider-assigned id")]
    MissingApplicantId,
}

impl ApplicantError {
    /// Id of an applicant that already exists at the provider, when the
    /// failure left one behind.
    #[must_use]
    pub fn created_applicant_id(&self) -> Option<&str> {
        match self {
            Self::AttachmentFailed { applicant_id, .. } => Some(applicant_id),
            _ => None,
        }
    }
}
