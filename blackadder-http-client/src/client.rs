//! Fluent HTTP client.

use futures::future::BoxFuture;
use http::Method;
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{
    BackoffStrategy, Body, ClientConfig, Context, HttpClientError, Plugin, PluginChain,
    ReqwestTransport, Response, Result, Transport,
};

/// Fluent, stateful HTTP client.
///
/// Calls are staged on an internal [`Context`] through chained methods and
/// executed by [`as_response`](Self::as_response) or
/// [`as_body`](Self::as_body). Executing detaches the staged context and
/// stages a fresh one, so the same client can immediately prepare the next
/// call while earlier ones are still in flight.
///
/// ```rust,no_run
/// use blackadder_http_client::HttpClient;
///
/// # async fn run() -> blackadder_http_client::Result<()> {
/// let mut client = HttpClient::new();
/// let body = client
///     .get("https://api.example.com/feeds")
///     .query("page", 2)
///     .retry(2)
///     .as_body()
///     .await?;
/// println!("{}", body.text()?);
/// # Ok(())
/// # }
/// ```
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    globals: Vec<Arc<dyn Plugin>>,
    staged: Context,
}

impl HttpClient {
    /// Create a client using reqwest and the default configuration.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    /// Create a client using the given transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::with_config(ClientConfig::default(), transport)
    }

    /// Create a client with the given configuration and transport.
    pub fn with_config<T: Transport + 'static>(config: ClientConfig, transport: T) -> Self {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// Create a client around a transport shared with other owners.
    pub fn with_shared_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let config = Arc::new(config);
        let staged = fresh_context(&config);
        Self {
            transport,
            config,
            globals: Vec::new(),
            staged,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the context staged for the next call.
    pub fn staged(&self) -> &Context {
        &self.staged
    }

    /// Get the plugins applied to every call.
    pub fn global_plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.globals
    }

    fn request(&mut self, method: Method, url: impl Into<String>) -> &mut Self {
        self.staged.set_method(method).set_url(url);
        self
    }

    /// Stage a GET call.
    pub fn get(&mut self, url: impl Into<String>) -> &mut Self {
        self.request(Method::GET, url)
    }

    /// Stage a POST call with a body.
    pub fn post(&mut self, url: impl Into<String>, body: impl Into<Body>) -> &mut Self {
        self.request(Method::POST, url).body(body)
    }

    /// Stage a PUT call with a body.
    pub fn put(&mut self, url: impl Into<String>, body: impl Into<Body>) -> &mut Self {
        self.request(Method::PUT, url).body(body)
    }

    /// Stage a PATCH call with a body.
    pub fn patch(&mut self, url: impl Into<String>, body: impl Into<Body>) -> &mut Self {
        self.request(Method::PATCH, url).body(body)
    }

    /// Stage a DELETE call.
    pub fn delete(&mut self, url: impl Into<String>) -> &mut Self {
        self.request(Method::DELETE, url)
    }

    /// Stage a DELETE call with a body.
    pub fn delete_with_body(&mut self, url: impl Into<String>, body: impl Into<Body>) -> &mut Self {
        self.request(Method::DELETE, url).body(body)
    }

    /// Stage a HEAD call.
    pub fn head(&mut self, url: impl Into<String>) -> &mut Self {
        self.request(Method::HEAD, url)
    }

    /// Set the body of the staged call.
    pub fn body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.staged.set_body(body);
        self
    }

    /// Set a structured body serialized from `value`.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        self.staged.set_body(value);
        Ok(self)
    }

    /// Set a form-encoded body.
    pub fn form<T: Serialize>(&mut self, form: &T) -> Result<&mut Self> {
        let encoded = serde_urlencoded::to_string(form)
            .map_err(|e| HttpClientError::plugin(format!("Failed to encode form data: {e}")))?;
        self.staged
            .add_header(CONTENT_TYPE, "application/x-www-form-urlencoded")?
            .set_body(encoded);
        Ok(self)
    }

    /// Set one header on the staged call.
    pub fn header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<&mut Self> {
        self.staged.add_header(name, value)?;
        Ok(self)
    }

    /// Set several headers on the staged call.
    ///
    /// Accepts any collection of name/value pairs; an empty one fails with
    /// [`HttpClientError::MissingHeaders`]. If any pair is invalid, none of
    /// them are staged.
    pub fn headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let headers: Vec<(K, V)> = headers.into_iter().collect();
        if headers.is_empty() {
            return Err(HttpClientError::MissingHeaders);
        }
        self.staged.add_headers(headers)?;
        Ok(self)
    }

    /// Set one query parameter on the staged call.
    pub fn query(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.staged.add_query(key, value);
        self
    }

    /// Set several query parameters on the staged call.
    ///
    /// Accepts any collection of name/value pairs; an empty one fails with
    /// [`HttpClientError::MissingQueryStrings`].
    pub fn queries<I, K, V>(&mut self, queries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut queries = queries.into_iter().peekable();
        if queries.peek().is_none() {
            return Err(HttpClientError::MissingQueryStrings);
        }
        for (key, value) in queries {
            self.staged.add_query(key, value);
        }
        Ok(self)
    }

    /// Set bearer authentication.
    pub fn bearer_auth(&mut self, token: impl AsRef<str>) -> Result<&mut Self> {
        self.header(AUTHORIZATION, format!("Bearer {}", token.as_ref()))
    }

    /// Set basic authentication.
    pub fn basic_auth(
        &mut self,
        username: impl AsRef<str>,
        password: Option<&str>,
    ) -> Result<&mut Self> {
        use base64::Engine;
        let credentials = format!("{}:{}", username.as_ref(), password.unwrap_or_default());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header(AUTHORIZATION, format!("Basic {encoded}"))
    }

    /// Set the timeout of the staged call.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.staged.set_timeout(timeout);
        self
    }

    /// Set how many times the staged call is retried after a failure.
    pub fn retry(&mut self, retries: u32) -> &mut Self {
        self.staged.set_retries(retries);
        self
    }

    /// Set the delay between retries of the staged call.
    pub fn retry_backoff(&mut self, backoff: BackoffStrategy) -> &mut Self {
        self.staged.set_backoff(backoff);
        self
    }

    /// Attach a plugin to the staged call only.
    ///
    /// Only [`Plugin`] implementations are accepted:
    ///
    /// ```rust
    /// use blackadder_http_client::{HttpClient, plugin_fn};
    ///
    /// let mut client = HttpClient::new();
    /// client.use_plugin(plugin_fn(|ctx, next| next.run(ctx)));
    /// ```
    ///
    /// ```rust,compile_fail
    /// use blackadder_http_client::HttpClient;
    ///
    /// let mut client = HttpClient::new();
    /// client.use_plugin("not a plugin");
    /// ```
    pub fn use_plugin<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.staged.add_plugin(Arc::new(plugin));
        self
    }

    /// Register a plugin for every call issued from now on.
    pub fn use_global<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.globals.push(Arc::new(plugin));
        self
    }

    /// Execute the staged call and resolve to its response.
    pub fn as_response(&mut self) -> BoxFuture<'static, Result<Response>> {
        let mut ctx = std::mem::replace(&mut self.staged, fresh_context(&self.config));
        if !ctx.req().has_timeout() {
            ctx.set_timeout(self.config.timeout);
        }

        let mut policy = self.config.retry_policy();
        if let Some(retries) = ctx.retries() {
            policy.max_retries = retries;
        }
        if let Some(backoff) = ctx.backoff() {
            policy.backoff = backoff.clone();
        }
        let chain = PluginChain::new(ctx.plugins(&self.globals), self.transport.clone());

        Box::pin(async move {
            let Some(url) = ctx.req().url() else {
                return Err(HttpClientError::MissingUrl);
            };
            url::Url::parse(url).map_err(|e| HttpClientError::InvalidUrl(format!("{url}: {e}")))?;
            debug!(
                method = %ctx.req().method(),
                url = ctx.req().url_or_empty(),
                plugins = chain.len(),
                max_retries = policy.max_retries,
                "Executing HTTP request"
            );

            policy.execute(&chain, ctx).await?.into_response()
        })
    }

    /// Execute the staged call and resolve to its body.
    pub fn as_body(&mut self) -> BoxFuture<'static, Result<Body>> {
        let response = self.as_response();
        Box::pin(async move { Ok(response.await?.into_body()) })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("globals", &self.globals.len())
            .field("staged", &self.staged)
            .finish()
    }
}

fn fresh_context(config: &ClientConfig) -> Context {
    let mut ctx = Context::new();
    let defaults = std::iter::once((USER_AGENT.as_str(), config.user_agent.as_str())).chain(
        config
            .default_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    );
    for (name, value) in defaults {
        if let Err(err) = ctx.add_header(name, value) {
            warn!(error = %err, "Skipping invalid default header");
        }
    }
    ctx
}
