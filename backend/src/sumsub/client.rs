use std::{fmt, sync::Arc, time::Duration};

use reqwest::{header, Client, Method};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use super::{
    error::SumsubError,
    observer::ResponseObserver,
    signer::{current_timestamp, sign_request},
};

/// Production Sumsub API host
pub const SUMSUB_BASE_URL: &str = "https://api.sumsub.com";

pub const CONTENT_TYPE_JSON: &str = "application/json";

pub const APP_TOKEN_HEADER: &str = "X-App-Token";
pub const SIGNATURE_HEADER: &str = "X-App-Access-Sig";
pub const TIMESTAMP_HEADER: &str = "X-App-Access-Ts";

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Credentials issued by Sumsub for this integration
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_token: String,
    pub secret_key: String,
    /// Verification level used when the caller does not name one
    pub level_name: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_token", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("level_name", &self.level_name)
            .finish()
    }
}

/// Authenticated HTTP client for the Sumsub REST API.
///
/// Every request is signed with a fresh timestamp. Responses with a status of
/// 400 or above are returned as [`SumsubError::Provider`]; nothing is retried
/// here.
pub struct SumsubClient {
    base_url: String,
    credentials: Credentials,
    http_client: ClientWithMiddleware,
    observer: Option<Arc<dyn ResponseObserver>>,
}

impl SumsubClient {
    /// Creates a new client against `base_url` (no trailing slash)
    ///
    /// # Panics
    ///
    /// If the HTTP client fails to be created
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Credentials, timeout: Duration) -> Self {
        let reqwest_client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("kyc-backend/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            http_client,
            observer: None,
        }
    }

    /// Attaches a diagnostic observer that sees every successful response body
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Performs one signed request and returns the full response body.
    ///
    /// `path` is everything after the host, query string included; it is what
    /// gets signed.
    ///
    /// # Errors
    ///
    /// - `SumsubError::Transport` - No response was received
    /// - `SumsubError::Provider` - The provider answered with status >= 400
    /// - `SumsubError::Signing` - The secret key is unusable
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        content_type: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, SumsubError> {
        let url = format!("{}{path}", self.base_url);

        let timestamp = current_timestamp();
        let signature = sign_request(
            &self.credentials.secret_key,
            timestamp,
            &method,
            path,
            body.as_deref(),
        )?;

        let mut request = self
            .http_client
            .request(method.clone(), &url)
            .header(APP_TOKEN_HEADER, &self.credentials.app_token)
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(header::ACCEPT, CONTENT_TYPE_JSON)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(body) = body {
            request = request.body(body);
        }

        tracing::debug!("Calling Sumsub {method} {path}");

        let response = request
            .send()
            .await
            .map_err(|source| SumsubError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let response_body = response
            .bytes()
            .await
            .map_err(|e| SumsubError::Transport {
                method: method.clone(),
                url: url.clone(),
                source: e.into(),
            })?;

        if status.as_u16() >= 400 {
            let body = String::from_utf8_lossy(&response_body).into_owned();
            tracing::warn!("Sumsub {method} {path} returned {status}: {body}");
            return Err(SumsubError::Provider { status, body });
        }

        Ok(response_body.to_vec())
    }

    /// Hands a successful response body to the observer, if one is attached
    pub(crate) async fn observe(&self, operation: &str, body: &[u8]) {
        if let Some(observer) = &self.observer {
            observer.observe(operation, body).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;

    pub fn test_credentials() -> Credentials {
        Credentials {
            app_token: "test-app-token".to_string(),
            secret_key: "test-secret-key".to_string(),
            level_name: "basic-kyc-level".to_string(),
        }
    }

    pub fn test_client(base_url: &str) -> SumsubClient {
        SumsubClient::new(base_url, test_credentials(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_call_sends_authentication_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/resources/applicants?levelName=basic-kyc-level")
            .match_header("x-app-token", "test-app-token")
            .match_header("x-app-access-sig", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
            .match_header("x-app-access-ts", Matcher::Regex("^[0-9]+$".to_string()))
            .match_header("accept", CONTENT_TYPE_JSON)
            .match_header("content-type", CONTENT_TYPE_JSON)
            .match_body(r#"{"externalUserId":"user-1"}"#)
            .with_status(200)
            .with_body(r#"{"id":"abc"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let body = client
            .call(
                Method::POST,
                "/resources/applicants?levelName=basic-kyc-level",
                CONTENT_TYPE_JSON,
                Some(br#"{"externalUserId":"user-1"}"#.to_vec()),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, br#"{"id":"abc"}"#);
    }

    /// True when `X-App-Access-Sig` is the HMAC of exactly what was sent
    pub fn is_signed_by(secret: &str, request: &mockito::Request) -> bool {
        let header = |name: &str| {
            request
                .header(name)
                .first()
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        let (Some(timestamp), Some(signature)) =
            (header("x-app-access-ts"), header("x-app-access-sig"))
        else {
            return false;
        };
        let (Ok(timestamp), Ok(method)) = (
            timestamp.parse::<i64>(),
            Method::from_bytes(request.method().as_bytes()),
        ) else {
            return false;
        };
        let body = request
            .body()
            .ok()
            .filter(|body| !body.is_empty())
            .map(Vec::as_slice);

        sign_request(secret, timestamp, &method, request.path_and_query(), body)
            .is_ok_and(|expected| expected == signature)
    }

    #[tokio::test]
    async fn test_signature_covers_query_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/resources/applicants?levelName=basic-kyc-level")
            .match_request(|request| is_signed_by("test-secret-key", request))
            .with_status(200)
            .with_body(r#"{"id":"abc"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .call(
                Method::POST,
                "/resources/applicants?levelName=basic-kyc-level",
                CONTENT_TYPE_JSON,
                Some(br#"{"externalUserId":"user-1"}"#.to_vec()),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signature_of_bodyless_get() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/resources/applicants/abc/one")
            .match_request(|request| is_signed_by("test-secret-key", request))
            .with_status(200)
            .with_body(r#"{"id":"abc"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .call(Method::GET, "/resources/applicants/abc/one", CONTENT_TYPE_JSON, None)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signature_with_other_secret_is_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/applicants/abc/one")
            .match_request(|request| is_signed_by("some-other-secret", request))
            .with_status(200)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .call(Method::GET, "/resources/applicants/abc/one", CONTENT_TYPE_JSON, None)
            .await
            .unwrap_err();

        // mockito answers unmatched requests with 501
        assert_eq!(err.provider_status(), Some(StatusCode::NOT_IMPLEMENTED));
    }

    #[tokio::test]
    async fn test_call_maps_error_status_to_provider_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/resources/applicants/missing/one")
            .with_status(404)
            .with_body(r#"{"description":"Applicant not found","code":404}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .call(
                Method::GET,
                "/resources/applicants/missing/one",
                CONTENT_TYPE_JSON,
                None,
            )
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            SumsubError::Provider { status, ref body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("Applicant not found"));
            }
            other => panic!("Expected provider error, got {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_call_server_error_is_retryable() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/applicants/abc/one")
            .with_status(503)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .call(Method::GET, "/resources/applicants/abc/one", CONTENT_TYPE_JSON, None)
            .await
            .unwrap_err();

        assert_eq!(err.provider_status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_call_connection_failure_is_transport_error() {
        // Nothing listens on port 1
        let client = test_client("http://127.0.0.1:1");
        let err = client
            .call(Method::GET, "/resources/applicants/abc/one", CONTENT_TYPE_JSON, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SumsubError::Transport { .. }), "got {err:?}");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let debug = format!("{:?}", test_credentials());
        assert!(!debug.contains("test-secret-key"));
        assert!(!debug.contains("test-app-token"));
        assert!(debug.contains("basic-kyc-level"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = test_client("https://api.sumsub.com/");
        assert_eq!(client.base_url, "https://api.sumsub.com");
    }
}
