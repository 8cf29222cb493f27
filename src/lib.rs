// Blackadder - A fluent HTTP client with a composable plugin pipeline
//
// Calls are staged with a chained builder, run through global and per-call
// plugins around a pluggable transport, and retried as a whole on failure.

// Re-export the client
pub use blackadder_http_client::*;

// Re-export the bundled plugins
#[cfg(feature = "plugins")]
pub use blackadder_plugins as plugins;

/// Create a client using reqwest and the default configuration.
pub fn create_client() -> HttpClient {
    HttpClient::new()
}

/// Create a client using the given transport.
pub fn create_client_with<T: Transport + 'static>(transport: T) -> HttpClient {
    HttpClient::with_transport(transport)
}

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        BackoffStrategy, Body, ClientConfig, Context, HttpClient, HttpClientError, Next, Plugin,
        Response, Result, Transport, TransportAdapter, create_client, create_client_with,
        plugin_fn,
    };

    #[cfg(feature = "plugins")]
    pub use blackadder_plugins::{
        AsJson, AttemptStats, Logger, MemoryStats, Stats, StatsSink, Timeout, ToError,
    };
}
