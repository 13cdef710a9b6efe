use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use kyc_backend::{
    server,
    sumsub::SumsubClient,
    types::{Environment, SumsubConfig},
    webhook::ReviewStore,
};
use mockito::{Server, ServerGuard};
use tower::ServiceExt;

use super::utils::{multipart_body, FormPart};

pub const APP_TOKEN: &str = "test-app-token";
pub const SECRET_KEY: &str = "test-secret-key";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const LEVEL_NAME: &str = "basic-kyc-level";
pub const CREATE_APPLICANT_PATH: &str = "/resources/applicants?levelName=basic-kyc-level";

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to a mock Sumsub server
pub struct TestSetup {
    pub router: Router,
    pub sumsub: ServerGuard,
    pub config: Arc<SumsubConfig>,
    pub review_store: Arc<ReviewStore>,
}

impl TestSetup {
    pub async fn new() -> Self {
        Self::with_environment(Environment::Development).await
    }

    pub async fn with_environment(environment: Environment) -> Self {
        setup_test_env();

        let sumsub = Server::new_async().await;
        let base_url = sumsub.url();
        let config = Arc::new(
            SumsubConfig::from_lookup(|name| {
                let value = match name {
                    "SUMSUB_APP_TOKEN" => APP_TOKEN,
                    "SUMSUB_SECRET_KEY" => SECRET_KEY,
                    "SUMSUB_WEBHOOK_ENDPOINT" => "http://localhost:8080/verify",
                    "SUMSUB_WEBHOOK_SECRET" => WEBHOOK_SECRET,
                    "SUMSUB_BASE_URL" => base_url.as_str(),
                    "SUMSUB_REQUEST_TIMEOUT_SECS" => "5",
                    _ => return None,
                };
                Some(value.to_string())
            })
            .expect("Test configuration must be valid"),
        );

        let client = Arc::new(SumsubClient::new(
            config.base_url.clone(),
            config.credentials(),
            config.request_timeout,
        ));
        let review_store = Arc::new(ReviewStore::new());

        let router = server::router(
            environment,
            config.clone(),
            client,
            review_store.clone(),
        );

        Self {
            router,
            sumsub,
            config,
            review_store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    pub async fn send_multipart(&self, route: &str, parts: &[FormPart<'_>]) -> Response {
        let (content_type, body) = multipart_body(parts);
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn send_post_request(&self, route: &str, payload: serde_json::Value) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Posts a callback body with the given digest headers
    pub async fn send_callback(
        &self,
        body: &[u8],
        digest: Option<&str>,
        digest_alg: Option<&str>,
    ) -> Response {
        let mut request = Request::builder()
            .uri("/verify")
            .method("POST")
            .header("Content-Type", "application/json");
        if let Some(digest) = digest {
            request = request.header("X-Payload-Digest", digest);
        }
        if let Some(digest_alg) = digest_alg {
            request = request.header("X-Payload-Digest-Alg", digest_alg);
        }
        self.send(request.body(Body::from(body.to_vec())).unwrap())
            .await
    }

    pub async fn send_request(&self, method: &str, route: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method(method)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}
