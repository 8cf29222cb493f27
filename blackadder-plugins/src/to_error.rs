//! Non-200 responses to errors.

use async_trait::async_trait;
use blackadder_http_client::{Context, HttpClientError, Next, Plugin, Result};
use http::StatusCode;

/// Fails the call when the response status is anything but `200 OK`.
///
/// The error message names the method, URL and status, and the error keeps
/// the status code and response headers. Since the failure happens inside
/// the pipeline, it is retried like any other.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToError;

#[async_trait]
impl Plugin for ToError {
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
