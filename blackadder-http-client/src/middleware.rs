//! Plugin chain for the HTTP client.
//!
//! Plugins wrap the transport call onion-style: each one runs its pre-logic,
//! hands control to the rest of the chain through [`Next`], and runs its
//! post-logic once the inner steps (ending with the transport) complete.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::{Context, Result, Transport};

/// Middleware wrapping the execution of one request.
///
/// ```rust
/// use async_trait::async_trait;
/// use blackadder_http_client::{Context, Next, Plugin, Result};
///
/// struct Shout;
///
/// #[async_trait]
/// impl Plugin for Shout {
///     async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
///         next.run(ctx).await?;
///         if let Some(res) = ctx.res_mut() {
///             let body = res.text()?.to_uppercase();
///             res.set_body(body);
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Process the call and, unless short-circuiting, continue with `next`.
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()>;
}

#[async_trait]
impl<P: Plugin + ?Sized> Plugin for Arc<P> {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        (**self).handle(ctx, next).await
    }
}

/// The rest of the chain below the current plugin.
///
/// `Next` is consumed by [`Next::run`], so a plugin can continue the chain at
/// most once per invocation:
///
/// ```rust,compile_fail
/// use async_trait::async_trait;
/// use blackadder_http_client::{Context, Next, Plugin, Result};
///
/// struct Twice;
///
/// #[async_trait]
/// impl Plugin for Twice {
///     async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
///         next.run(ctx).await?;
///         next.run(ctx).await
///     }
/// }
/// ```
pub struct Next<'a> {
    plugins: &'a [Arc<dyn Plugin>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(plugins: &'a [Arc<dyn Plugin>], transport: &'a dyn Transport) -> Self {
        Self { plugins, transport }
    }

    /// Run the remaining plugins and then the transport.
    pub fn run(self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        match self.plugins.split_first() {
            Some((plugin, rest)) => plugin.handle(ctx, Next::new(rest, self.transport)),
            None => self.transport.execute(ctx),
        }
    }

    /// Number of plugins still to run before the transport.
    pub fn remaining(&self) -> usize {
        self.plugins.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.plugins.len())
            .finish()
    }
}

/// Plugins composed around a transport.
pub struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
    transport: Arc<dyn Transport>,
}

impl PluginChain {
    /// Compose the plugins, outermost first, around the transport.
    pub fn new(plugins: Vec<Arc<dyn Plugin>>, transport: Arc<dyn Transport>) -> Self {
        Self { plugins, transport }
    }

    /// Add a plugin inside the ones already in the chain.
    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Number of plugins in the chain.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the chain has no plugins.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Execute the call once through every plugin and the transport.
    pub async fn execute(&self, ctx: &mut Context) -> Result<()> {
        Next::new(&self.plugins, self.transport.as_ref()).run(ctx).await
    }
}

/// Plugin built from a function, see [`plugin_fn`].
pub struct PluginFn<F>(F);

/// Create a plugin from a function returning a boxed future.
///
/// ```rust
/// use blackadder_http_client::plugin_fn;
/// use std::time::Duration;
///
/// let slow = plugin_fn(|ctx, next| {
///     ctx.set_timeout(Duration::from_secs(5));
///     next.run(ctx)
/// });
/// ```
pub fn plugin_fn<F>(f: F) -> PluginFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    PluginFn(f)
}

#[async_trait]
impl<F> Plugin for PluginFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        (self.0)(ctx, next).await
    }
}
