//! JSON response body plugin.

use async_trait::async_trait;
use blackadder_http_client::{Body, Context, Next, Plugin, Result};
use serde_json::Value;

/// Parses the response body into [`Body::Json`] once the call completes.
///
/// Empty bodies stay empty and bodies that are already structured are left
/// alone. A body that is not valid JSON fails the call with
/// [`HttpClientError::Json`](blackadder_http_client::HttpClientError::Json).
#[derive(Debug, Clone, Copy, Default)]
pub struct AsJson;

#[async_trait]
impl Plugin for AsJson {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        next.run(ctx).await?;

        if let Some(res) = ctx.res_mut()
            && let Body::Bytes(bytes) = res.body()
            && !bytes.is_empty()
        {
            let value: Value = serde_json::from_slice(bytes)?;
            res.set_body(value);
        }
        Ok(())
    }
}
