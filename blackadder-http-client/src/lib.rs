//! # Blackadder HTTP Client
//!
//! A fluent HTTP client whose calls run through a composable plugin pipeline
//! around a pluggable transport.
//!
//! ## Features
//!
//! - **Fluent builder**: stage method, URL, headers, query, body, timeout and
//!   retries with chained calls, then execute with `as_response` or `as_body`
//! - **Plugins**: onion-style middleware, registered globally or per call
//! - **Transports**: reqwest by default, or any [`Transport`] /
//!   [`TransportAdapter`] implementation
//! - **Retries**: per-call retry budget with an optional backoff strategy and
//!   a log of failed attempts on the final response
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blackadder_http_client::HttpClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = HttpClient::new();
//!
//!     let response = client
//!         .get("https://api.example.com/users")
//!         .header("accept", "application/json")?
//!         .as_response()
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```
//!
//! ## With Plugins and Retries
//!
//! ```rust,no_run
//! use blackadder_http_client::{plugin_fn, ClientConfig, HttpClient, ReqwestTransport};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .timeout(Duration::from_secs(5))
//!         .retries(1)
//!         .build();
//!
//!     let mut client = HttpClient::with_config(config, ReqwestTransport::new());
//!     client.use_global(plugin_fn(|ctx, next| {
//!         tracing::info!(url = ctx.req().url_or_empty(), "outgoing call");
//!         next.run(ctx)
//!     }));
//!
//!     let body = client
//!         .post("https://api.example.com/orders", serde_json::json!({"item": "widget"}))
//!         .retry(3)
//!         .as_body()
//!         .await?;
//!
//!     println!("{}", body.text()?);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod context;
mod error;
mod middleware;
mod request;
mod response;
mod retry;
mod transport;

#[cfg(test)]
mod testing;

pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, RETRIES_ENV, TIMEOUT_ENV, default_user_agent};
pub use context::Context;
pub use error::{BoxError, HttpClientError, Result};
pub use middleware::{Next, Plugin, PluginChain, PluginFn, plugin_fn};
pub use request::{Body, DEFAULT_TIMEOUT, Request};
pub use response::{Response, Retry};
pub use retry::{BackoffStrategy, RetryPolicy, with_retries};
pub use transport::{NativeResponse, ReqwestOptions, ReqwestTransport, Transport, TransportAdapter};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        BackoffStrategy, Body, ClientConfig, Context, HttpClient, HttpClientError, Next, Plugin,
        Response, Result, Transport, plugin_fn,
    };
}
