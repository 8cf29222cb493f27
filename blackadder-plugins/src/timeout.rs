//! Per-call timeout plugin.

use async_trait::async_trait;
use blackadder_http_client::{Context, Next, Plugin, Result};
use std::time::Duration;

/// Sets the request timeout before the rest of the chain runs.
#[derive(Debug, Clone, Copy)]
pub struct Timeout(Duration);

impl Timeout {
    /// Create a timeout plugin.
    pub fn new(timeout: Duration) -> Self {
        Self(timeout)
    }

    /// Create a timeout plugin from milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Get the timeout applied.
    pub fn duration(&self) -> Duration {
        self.0
    }
}

#[async_trait]
impl Plugin for Timeout {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        ctx.set_timeout(self.0);
        next.run(ctx).await
    }
}
