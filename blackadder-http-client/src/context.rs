//! Per-call execution context.

use http::{HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;

use crate::{BackoffStrategy, Body, HttpClientError, Plugin, Request, Response, Result};

/// Everything one logical call needs: the request, its eventual response and
/// the plugins attached to this call only.
///
/// A context is staged by the [`HttpClient`](crate::HttpClient), detached when
/// the call is triggered and then owned by that single execution.
#[derive(Default)]
pub struct Context {
    req: Request,
    res: Option<Response>,
    plugins: Vec<Arc<dyn Plugin>>,
    retries: Option<u32>,
    backoff: Option<BackoffStrategy>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("req", &self.req)
            .field("res", &self.res)
            .field("plugins", &self.plugins.len())
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a plugin to this call.
    pub fn add_plugin(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    /// Set the method.
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.req.set_method(method);
        self
    }

    /// Set the URL.
    pub fn set_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.req.set_url(url.into());
        self
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn add_header(
        &mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<&mut Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.req.headers_mut().insert(name, value);
        Ok(self)
    }

    /// Set several headers at once.
    ///
    /// Nothing is staged unless every pair is valid.
    pub fn add_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let parsed = headers
            .into_iter()
            .map(|(name, value)| parse_header(name.as_ref(), value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        for (name, value) in parsed {
            self.req.headers_mut().insert(name, value);
        }
        Ok(self)
    }

    /// Set a query parameter.
    pub fn add_query(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.req.insert_query(key.into(), value.to_string());
        self
    }

    /// Set the body.
    pub fn set_body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.req.set_body(Some(body.into()));
        self
    }

    /// Set the timeout.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.req.set_timeout(timeout);
        self
    }

    /// Set the retry budget for this call.
    pub fn set_retries(&mut self, retries: u32) -> &mut Self {
        self.retries = Some(retries);
        self
    }

    /// Set the delay strategy between retries for this call.
    pub fn set_backoff(&mut self, backoff: BackoffStrategy) -> &mut Self {
        self.backoff = Some(backoff);
        self
    }

    /// Get the retry budget, if this call set one.
    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    /// Get the backoff strategy, if this call set one.
    pub fn backoff(&self) -> Option<&BackoffStrategy> {
        self.backoff.as_ref()
    }

    /// Merge the given global plugins with this call's plugins, in execution
    /// order: globals first, then per-call plugins.
    pub fn plugins(&self, globals: &[Arc<dyn Plugin>]) -> Vec<Arc<dyn Plugin>> {
        globals
            .iter()
            .chain(self.plugins.iter())
            .cloned()
            .collect()
    }

    /// Get the request.
    pub fn req(&self) -> &Request {
        &self.req
    }

    /// Get the request for modification.
    pub fn req_mut(&mut self) -> &mut Request {
        &mut self.req
    }

    /// Get the response, once one has been produced.
    pub fn res(&self) -> Option<&Response> {
        self.res.as_ref()
    }

    /// Get the response for modification.
    pub fn res_mut(&mut self) -> Option<&mut Response> {
        self.res.as_mut()
    }

    /// Set the response.
    pub fn set_res(&mut self, res: Response) -> &mut Self {
        self.res = Some(res);
        self
    }

    /// Remove and return the response.
    pub fn take_res(&mut self) -> Option<Response> {
        self.res.take()
    }

    /// Consume the context and return its response.
    pub fn into_response(self) -> Result<Response> {
        self.res.ok_or(HttpClientError::NoResponse)
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| HttpClientError::InvalidHeader(format!("{name}: {e}")))?;
    Ok((header_name, header_value))
}
