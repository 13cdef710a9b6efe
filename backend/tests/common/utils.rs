use axum::response::Response;
use http_body_util::BodyExt;
use kyc_backend::sumsub::signer::sign_request;
use reqwest::Method;

use super::SECRET_KEY;

/// One part of a hand-built multipart form
pub struct FormPart<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

impl<'a> FormPart<'a> {
    pub const fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            content: value.as_bytes(),
        }
    }

    pub const fn file(name: &'a str, filename: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            content,
        }
    }
}

pub const TEST_BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Encodes `parts` as `multipart/form-data`; returns the content type and body
pub fn multipart_body(parts: &[FormPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{TEST_BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{TEST_BOUNDARY}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={TEST_BOUNDARY}"),
        body,
    )
}

/// The four fields of a complete submission
pub fn submission_parts<'a>(image: &'a [u8]) -> Vec<FormPart<'a>> {
    vec![
        FormPart::text("externalUserId", "user-1"),
        FormPart::text("idDocType", "PASSPORT"),
        FormPart::text("country", "VNM"),
        FormPart::file("content", "passport.jpg", image),
    ]
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Raw response body
pub async fn response_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Whether the provider request carries a signature over its own timestamp,
/// method, path with query, and body
pub fn is_signed(request: &mockito::Request) -> bool {
    let header = |name: &str| {
        request
            .header(name)
            .first()
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let (Some(timestamp), Some(signature)) =
        (header("X-App-Access-Ts"), header("X-App-Access-Sig"))
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

    sign_request(SECRET_KEY, timestamp, &method, request.path_and_query(), body)
        .is_ok_and(|expected| expected == signature)
}
