//! Request/response logging plugin.

use async_trait::async_trait;
use blackadder_http_client::{Context, Next, Plugin, Result};
use tracing::Level;

/// Logs `"<METHOD> <url> <status> <elapsed> ms"` for every completed call.
///
/// Nothing is logged when the call fails; failures surface as errors.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: Level,
}

impl Logger {
    /// Create a logger emitting at `INFO`.
    pub fn new() -> Self {
        Self { level: Level::INFO }
    }

    /// Set the level of the emitted events.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Render the log line for a completed call.
    pub fn message(ctx: &Context) -> Option<String> {
        let res = ctx.res()?;
        Some(format!(
            "{} {} {} {} ms",
            ctx.req().method(),
            ctx.req().url_or_empty(),
            res.status_code(),
            res.elapsed_millis()
        ))
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! emit {
    ($level:expr, $ctx:expr, $message:expr) => {{
        let method = $ctx.req().method().as_str();
        let url = $ctx.req().url_or_empty();
        match $level {
            Level::ERROR => tracing::error!(method, url, "{}", $message),
            Level::WARN => tracing::warn!(method, url, "{}", $message),
            Level::INFO => tracing::info!(method, url, "{}", $message),
            Level::DEBUG => tracing::debug!(method, url, "{}", $message),
            _ => tracing::trace!(method, url, "{}", $message),
        }
    }};
}

#[async_trait]
impl Plugin for Logger {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        next.run(ctx).await?;

        if let Some(message) = Self::message(ctx) {
            emit!(self.level, ctx, message);
        }
        Ok(())
    }
}
