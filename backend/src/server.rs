use std::{sync::Arc, time::Duration};

use aide::openapi::{Info, OpenApi};
use axum::{http::StatusCode, Extension, Router};
use datadog_tracing::axum::{shutdown_signal, OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::routes;
use crate::{
    sumsub::SumsubClient,
    types::{Environment, SumsubConfig},
    webhook::ReviewStore,
};

/// Builds the application router with its shared dependencies attached
pub fn router(
    environment: Environment,
    config: Arc<SumsubConfig>,
    sumsub: Arc<SumsubClient>,
    review_store: Arc<ReviewStore>,
) -> Router {
    let mut openapi = OpenApi {
        info: Info {
            title: "Sumsub KYC Backend".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    };

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(config))
        .layer(Extension(sumsub))
        .layer(Extension(review_store))
}

/// Answers 408 once a request has run for longer than `limit`
fn timeout_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

/// Starts the server with the given environment and dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    config: Arc<SumsubConfig>,
    sumsub: Arc<SumsubClient>,
    review_store: Arc<ReviewStore>,
) -> anyhow::Result<()> {
    // A submission makes two provider calls
    let request_timeout = config.request_timeout * 2 + Duration::from_secs(5);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let webhook_endpoint = config.webhook_endpoint.clone();

    let router = router(environment, config, sumsub, review_store)
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(timeout_layer(request_timeout));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 KYC Backend started on http://{addr}");
    tracing::info!("  - Document processing endpoint: /process-ekyc");
    tracing::info!("  - Sumsub webhook endpoint: /verify ({webhook_endpoint})");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}
