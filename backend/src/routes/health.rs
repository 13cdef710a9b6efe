use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{types::SumsubConfig, webhook::ReviewStore};

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    /// Crate version
    semver: &'static str,
    /// Build commit, when `GIT_REV` was set at compile time
    rev: Option<&'static str>,
    /// Sumsub level used when a request names none
    level_name: String,
    /// Applicants with at least one verified callback since startup
    tracked_reviews: usize,
}

/// Liveness check with the verification defaults in effect
pub async fn handler(
    Extension(config): Extension<Arc<SumsubConfig>>,
    Extension(store): Extension<Arc<ReviewStore>>,
) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
        level_name: config.level_name.clone(),
        tracked_reviews: store.tracked_count().await,
    })
}
