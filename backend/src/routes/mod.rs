mod docs;
pub mod ekyc;
pub mod health;
pub mod v1;
pub mod webhook;

use aide::axum::{routing::get, ApiRouter};
use axum::{extract::DefaultBodyLimit, routing::post};

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .route(
            "/process-ekyc",
            post(ekyc::process_ekyc).layer(DefaultBodyLimit::max(ekyc::MAX_FORM_BYTES)),
        )
        .route("/verify", post(webhook::verify))
        .nest("/v1", v1::handler())
}
