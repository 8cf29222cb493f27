//! Canned transport for plugin tests.

use async_trait::async_trait;
use blackadder_http_client::{
    Body, Context, HttpClientError, Plugin, PluginChain, Response, Result, Transport,
};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) const URL: &str = "http://www.example.com/feeds";

/// Answers every call with the same response, after an optional run of
/// connection failures.
pub(crate) struct Canned {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    elapsed: Duration,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl Canned {
    pub(crate) fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.into(),
            elapsed: Duration::from_millis(42),
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn ok(body: impl Into<Body>) -> Self {
        Self::new(200, body)
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        self
    }

    pub(crate) fn failing_first(self, failures: usize) -> Self {
        self.failures.store(failures, Ordering::SeqCst);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for Canned {
    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HttpClientError::Transport {
                method: ctx.req().method().clone(),
                url: ctx.req().url_or_empty().to_string(),
                message: "connection refused".to_string(),
                status: None,
                source: "connection refused".into(),
            });
        }

        let res = Response::new(self.status)
            .with_headers(self.headers.clone())
            .with_body(self.body.clone())
            .with_url(ctx.req().url_or_empty())
            .with_elapsed(self.elapsed);
        ctx.set_res(res);
        Ok(())
    }
}

pub(crate) fn context() -> Context {
    let mut ctx = Context::new();
    ctx.set_url(URL);
    ctx
}

/// Run one attempt of `plugin` around `transport`.
pub(crate) async fn run<P: Plugin + 'static>(
    plugin: P,
    transport: Canned,
) -> (Result<()>, Context) {
    let chain = PluginChain::new(Vec::new(), Arc::new(transport)).with_plugin(plugin);
    let mut ctx = context();
    let outcome = chain.execute(&mut ctx).await;
    (outcome, ctx)
}
