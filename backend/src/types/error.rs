//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::sumsub::ApplicantError;
use crate::webhook::WebhookError;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
    /// Applicant that already exists at the provider despite the failure.
    /// Retry with `POST /v1/applicants/{applicantId}/documents`.
    #[serde(skip_serializing_if = "Option::is_none")]
    applicant_id: Option<String>,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
                applicant_id: None,
            },
        }
    }

    /// 400 with the given code
    #[must_use]
    pub const fn bad_request(code: &'static str, msg: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg, false)
    }

    /// 404 with the given code
    #[must_use]
    pub const fn not_found(code: &'static str, msg: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg, false)
    }

    #[must_use]
    pub fn with_applicant_id(mut self, applicant_id: impl Into<String>) -> Self {
        self.inner.applicant_id = Some(applicant_id.into());
        self
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert applicant lifecycle errors to application errors.
///
/// The full error chain is logged here; the response only carries a code.
impl From<ApplicantError> for AppError {
    fn from(err: ApplicantError) -> Self {
        let retry = match &err {
            ApplicantError::CreationFailed(source)
            | ApplicantError::AttachmentFailed { source, .. }
            | ApplicantError::LookupFailed { source, .. }
            | ApplicantError::AccessTokenFailed(source) => source.is_retryable(),
            ApplicantError::MissingApplicantId => false,
        };

        match &err {
            ApplicantError::CreationFailed(_) => {
                tracing::error!("Applicant creation failed: {err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "applicant_creation_failed",
                    "Error processing request",
                    retry,
                )
            }
            ApplicantError::AttachmentFailed { applicant_id, .. } => {
                tracing::error!("Document attachment failed: {err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "document_attachment_failed",
                    "Error processing request",
                    retry,
                )
                .with_applicant_id(applicant_id.clone())
            }
            ApplicantError::LookupFailed { source, .. }
                if source.provider_status() == Some(StatusCode::NOT_FOUND) =>
            {
                tracing::warn!("Applicant lookup failed: {err}");
                Self::not_found("applicant_not_found", "Applicant not found")
            }
            ApplicantError::LookupFailed { .. } => {
                tracing::error!("Applicant lookup failed: {err}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "applicant_lookup_failed",
                    "Error retrieving applicant",
                    retry,
                )
            }
            ApplicantError::AccessTokenFailed(_) => {
                tracing::error!("Access token generation failed: {err}");
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "access_token_failed",
                    "Error generating access token",
                    retry,
                )
            }
            ApplicantError::MissingApplicantId => {
                tracing::error!("{err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "applicant_creation_failed",
                    "Error processing request",
                    false,
                )
            }
        }
    }
}

/// Convert callback errors to application errors.
///
/// Verification failures carry no detail about why the digest was rejected.
impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::VerificationFailed => Self::new(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized",
                false,
            ),
            WebhookError::InvalidPayload(e) => {
                tracing::warn!("Invalid callback payload: {e}");
                Self::bad_request("invalid_payload", "Invalid JSON payload")
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
