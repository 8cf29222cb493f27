//! Response record.

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{Body, HttpClientError, Result};

/// One failed attempt recorded by the retry controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retry {
    /// Message of the failure.
    pub reason: String,
    /// Status code carried by the failure, if any.
    pub status_code: Option<u16>,
}

/// Normalized result of a completed call.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    url: String,
    elapsed: Duration,
    retries: Vec<Retry>,
}

impl Response {
    /// Create a response with an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Body::Empty,
            url: String::new(),
            elapsed: Duration::ZERO,
            retries: Vec::new(),
        }
    }

    /// Set the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the elapsed time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Set the retry log.
    pub fn with_retries(mut self, retries: Vec<Retry>) -> Self {
        self.retries = retries;
        self
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the status code as an integer.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Consume the response and return the body.
    pub fn into_body(self) -> Body {
        self.body
    }

    /// Get the body as text.
    pub fn text(&self) -> Result<String> {
        self.body.text()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            Body::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| HttpClientError::Json(e.to_string())),
            Body::Bytes(bytes) => serde_json::from_slice(bytes)
                .map_err(|e| HttpClientError::Json(e.to_string())),
            Body::Empty => Err(HttpClientError::Json("empty body".to_string())),
        }
    }

    /// Get the response URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the wall-clock duration of the transport call.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Get the elapsed time in milliseconds.
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Get the failed attempts that preceded this response.
    pub fn retries(&self) -> &[Retry] {
        &self.retries
    }

    pub(crate) fn set_retries(&mut self, retries: Vec<Retry>) {
        self.retries = retries;
    }

    pub(crate) fn take_retries(&mut self) -> Vec<Retry> {
        std::mem::take(&mut self.retries)
    }
}
