//! HTTP client error types.

use http::{HeaderMap, Method};
use thiserror::Error;

/// Result type for HTTP client operations.
pub type Result<T> = std::result::Result<T, HttpClientError>;

/// Boxed error used as the source of transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// `headers` was called without any pairs.
    #[error("missing headers")]
    MissingHeaders,

    /// `queries` was called without any pairs.
    #[error("missing query strings")]
    MissingQueryStrings,

    /// A header name or value could not be represented.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The call was executed before a method and URL were set.
    #[error("No URL set for request")]
    MissingUrl,

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport failed to complete the call.
    #[error("Request failed for {method} {url}: {message}")]
    Transport {
        /// Method of the failed call.
        method: Method,
        /// URL of the failed call.
        url: String,
        /// Message of the underlying failure.
        message: String,
        /// Status code, when the transport reported one.
        status: Option<u16>,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },

    /// The response was received but is not acceptable.
    #[error("Received HTTP code {status} for {method} {url}")]
    Response {
        /// Method of the call.
        method: Method,
        /// URL of the call.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response headers.
        headers: HeaderMap,
    },

    /// The body is not valid UTF-8 text.
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// The pipeline finished without any step producing a response.
    #[error("Pipeline completed without a response")]
    NoResponse,

    /// Failure raised by a plugin.
    #[error("Plugin error: {0}")]
    Plugin(String),
}

impl HttpClientError {
    /// Create a plugin error.
    pub fn plugin(message: impl Into<String>) -> Self {
        Self::Plugin(message.into())
    }

    /// Get the HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the response headers carried by this error, if any.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Response { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Check if this error comes from misusing the builder.
    ///
    /// Usage errors are reported before any attempt is made and are never
    /// retried.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::MissingHeaders
                | Self::MissingQueryStrings
                | Self::InvalidHeader(_)
                | Self::MissingUrl
                | Self::InvalidUrl(_)
        )
    }

    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if the transport failed because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for HttpClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
