//! Scripted transport and helper plugins for unit tests.

use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{Context, HttpClientError, Next, Plugin, Response, Result, Transport};

enum Step {
    Fail,
    Status(u16),
}

/// Transport answering from a script, then echoing `"<METHOD> <url>"` with 200.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    pub(crate) fn echo() -> Self {
        Self::default()
    }

    pub(crate) fn failing(times: usize) -> Self {
        Self {
            script: Mutex::new((0..times).map(|_| Step::Fail).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            script: Mutex::new(statuses.into_iter().map(Step::Status).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.script.lock().pop_front();
        let url = ctx.req().url_or_empty().to_string();
        let status = match step {
            Some(Step::Fail) => {
                return Err(HttpClientError::Transport {
                    method: ctx.req().method().clone(),
                    url,
                    message: "connection reset".to_string(),
                    status: None,
                    source: "connection reset".into(),
                });
            }
            Some(Step::Status(status)) => status,
            None => 200,
        };

        let echo = format!("{} {}", ctx.req().method(), url);
        let status =
            StatusCode::from_u16(status).map_err(|e| HttpClientError::plugin(e.to_string()))?;
        ctx.set_res(Response::new(status).with_body(echo).with_url(url));
        Ok(())
    }
}

struct Append(&'static str);

#[async_trait]
impl Plugin for Append {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        next.run(ctx).await?;
        if let Some(res) = ctx.res_mut() {
            let body = format!("{}{}", res.text()?, self.0);
            res.set_body(body);
        }
        Ok(())
    }
}

/// Plugin appending `suffix` to the response body on the way out.
pub(crate) fn append(suffix: &'static str) -> Arc<dyn Plugin> {
    Arc::new(Append(suffix))
}

struct FailUnlessOk;

#[async_trait]
impl Plugin for FailUnlessOk {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        next.run(ctx).await?;
        match ctx.res() {
            Some(res) if res.status() != StatusCode::OK => Err(HttpClientError::Response {
                method: ctx.req().method().clone(),
                url: ctx.req().url_or_empty().to_string(),
                status: res.status_code(),
                headers: res.headers().clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Plugin failing with a response error when the status is not 200.
pub(crate) fn fail_unless_ok() -> Arc<dyn Plugin> {
    Arc::new(FailUnlessOk)
}
