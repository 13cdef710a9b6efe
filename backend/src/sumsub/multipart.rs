//! Buffered `multipart/form-data` encoder.
//!
//! The provider signs the exact request body, so the form has to be fully
//! materialised before the request is sent rather than streamed by the HTTP
//! client.

use tokio::io::AsyncRead;
use uuid::Uuid;

/// A `multipart/form-data` body under construction
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    buffer: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    #[must_use]
    pub const fn with_boundary(boundary: String) -> Self {
        Self {
            boundary,
            buffer: Vec::new(),
        }
    }

    /// Value for the request's `Content-Type` header
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Appends a binary file part, draining `reader` to its end.
    ///
    /// The reader is consumed and dropped before this returns, whether or not
    /// reading succeeded.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `reader` fails
    pub async fn file_part<R>(&mut self, name: &str, filename: &str, mut reader: R) -> std::io::Result<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.part_header(
            &format!("form-data; name=\"{name}\"; filename=\"{filename}\""),
            "application/octet-stream",
        );
        let copied = tokio::io::copy(&mut reader, &mut self.buffer).await?;
        self.buffer.extend_from_slice(b"\r\n");
        Ok(copied)
    }

    /// Appends a JSON part
    pub fn json_part(&mut self, name: &str, json: &[u8]) {
        self.part_header(&format!("form-data; name=\"{name}\""), "application/json");
        self.buffer.extend_from_slice(json);
        self.buffer.extend_from_slice(b"\r\n");
    }

    /// Writes the closing boundary and returns `(content_type, body)`
    #[must_use]
    pub fn finish(mut self) -> (String, Vec<u8>) {
        let content_type = self.content_type();
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (content_type, self.buffer)
    }

    fn part_header(&mut self, disposition: &str, content_type: &str) {
        self.buffer.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: {disposition}\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
    }
}
