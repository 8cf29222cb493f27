//! # Blackadder Plugins
//!
//! Ready-made plugins for the Blackadder HTTP client.
//!
//! - [`AsJson`]: parse the response body as JSON
//! - [`ToError`]: fail calls answered with anything but `200 OK`
//! - [`Logger`]: log one line per completed call
//! - [`Stats`] and [`AttemptStats`]: emit request counts and timings to a
//!   [`StatsSink`]
//! - [`Timeout`]: set the request timeout
//!
//! ## Example
//!
//! ```rust,no_run
//! use blackadder_http_client::HttpClient;
//! use blackadder_plugins::{AsJson, Logger, MemoryStats, Stats, ToError};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stats = Arc::new(MemoryStats::new());
//!
//!     let mut client = HttpClient::new();
//!     client
//!         .use_global(Logger::new())
//!         .use_global(Stats::new(stats.clone()).feed("users"));
//!
//!     let body = client
//!         .get("https://api.example.com/users")
//!         .use_plugin(ToError)
//!         .use_plugin(AsJson)
//!         .as_body()
//!         .await?;
//!
//!     println!("{:?} after {} requests", body.as_json(), stats.count("http.users.requests"));
//!     Ok(())
//! }
//! ```

mod json;
mod logger;
mod stats;
mod timeout;
mod to_error;

#[cfg(test)]
mod testing;

pub use json::AsJson;
pub use logger::Logger;
#[cfg(feature = "prometheus")]
pub use stats::PrometheusStats;
pub use stats::{AttemptStats, MemoryStats, Stats, StatsSink};
pub use timeout::Timeout;
pub use to_error::ToError;
