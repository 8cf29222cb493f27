//! HTTP client configuration.

use std::env;
use std::time::Duration;

use crate::request::DEFAULT_TIMEOUT;
use crate::retry::{BackoffStrategy, RetryPolicy};

/// Environment variable overriding the default timeout, in milliseconds.
pub const TIMEOUT_ENV: &str = "BLACKADDER_TIMEOUT_MS";

/// Environment variable overriding the default retry budget.
pub const RETRIES_ENV: &str = "BLACKADDER_RETRIES";

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent sent with every call unless overridden.
    pub user_agent: String,
    /// Timeout for calls that do not set one.
    pub timeout: Duration,
    /// Retry budget for calls that do not set one.
    pub retries: u32,
    /// Delay strategy between retries for calls that do not set one.
    pub backoff: BackoffStrategy,
    /// Headers added to every call.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            backoff: BackoffStrategy::None,
            default_headers: Vec::new(),
        }
    }
}

/// `<library-name>/<library-version>`.
pub fn default_user_agent() -> String {
    format!("blackadder/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Create a configuration from the environment, keeping defaults for
    /// unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env::var(TIMEOUT_ENV).ok().and_then(|v| v.trim().parse::<u64>().ok()) {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = env::var(RETRIES_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            config.retries = retries;
        }

        config
    }

    /// Retry policy applied to calls that do not override it.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries).with_backoff(self.backoff.clone())
    }
}

/// Builder for HTTP client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the default retry budget.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the default delay strategy between retries.
    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
