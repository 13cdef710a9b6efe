pub mod access_tokens;
pub mod applicants;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::extract::DefaultBodyLimit;

use super::ekyc::MAX_FORM_BYTES;

/// Creates the v1 API router with all v1 handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .api_route("/applicants/{applicant_id}", get(applicants::get_applicant))
        .api_route(
            "/applicants/{applicant_id}/review",
            get(applicants::get_review),
        )
        .route(
            "/applicants/{applicant_id}/documents",
            axum::routing::post(applicants::add_document)
                .layer(DefaultBodyLimit::max(MAX_FORM_BYTES)),
        )
        .api_route("/access-tokens", post(access_tokens::create_access_token))
}
