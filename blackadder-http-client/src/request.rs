//! Request descriptor and payload types.

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde_json::Value;
use std::time::Duration;

use crate::{HttpClientError, Result};

/// Timeout used when a request does not carry one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Request or response payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No payload.
    #[default]
    Empty,
    /// Raw bytes.
    Bytes(Bytes),
    /// Structured payload, serialized as JSON on the wire.
    Json(Value),
}

impl Body {
    /// Check if there is no payload.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Check if the payload is structured.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Get the payload as raw bytes, if it is not structured.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Get the structured payload, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Get the payload as text.
    ///
    /// Structured payloads are rendered as JSON.
    pub fn text(&self) -> Result<String> {
        match self {
            Self::Empty => Ok(String::new()),
            Self::Bytes(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|e| HttpClientError::InvalidBody(e.to_string())),
            Self::Json(value) => Ok(value.to_string()),
        }
    }

    /// Encode the payload for the wire.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Json(value) => Ok(Bytes::from(serde_json::to_vec(value)?)),
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Bytes(Bytes::from(text))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Description of one outbound HTTP call.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Option<String>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Body>,
    timeout: Option<Duration>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: None,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }
}

impl Request {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL, if set.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Get the URL, or an empty string when unset.
    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Get a query parameter value.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check if any query parameters are set.
    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    /// Get the body, if set.
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Get the timeout, falling back to [`DEFAULT_TIMEOUT`].
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Check if a timeout was set explicitly.
    pub fn has_timeout(&self) -> bool {
        self.timeout.is_some()
    }

    pub(crate) fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = Some(url);
    }

    pub(crate) fn set_body(&mut self, body: Option<Body>) {
        self.body = body;
    }

    /// Set the timeout for this request.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Set a query parameter, replacing the value of an existing name in place.
    pub(crate) fn insert_query(&mut self, key: String, value: String) {
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
    }
}
