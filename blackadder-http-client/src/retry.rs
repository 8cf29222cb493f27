//! Retry controller and backoff strategies.

use std::time::Duration;
use tracing::{debug, warn};

use crate::{Context, PluginChain, Result, Retry};

/// Retry policy for one call: how many extra attempts, and how long to wait
/// before each of them.
///
/// Every pipeline failure is retried, whether it came from the transport or
/// from a plugin, until the budget is spent. Usage errors are returned at
/// once.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    /// Maximum number of attempts after the first one.
    pub max_retries: u32,
    /// Delay before each retry.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a policy retrying immediately up to `max_retries` times.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::None,
        }
    }

    /// A policy making exactly one attempt.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the chain until it succeeds or the budget is spent.
    ///
    /// On success the failed attempts are recorded on the response's retry
    /// log. Once the budget is spent the last failure is returned as is.
    pub async fn execute(&self, chain: &PluginChain, mut ctx: Context) -> Result<Context> {
        let mut retries: Vec<Retry> = Vec::new();

        loop {
            match chain.execute(&mut ctx).await {
                Ok(()) => {
                    if let Some(res) = ctx.res_mut() {
                        res.set_retries(retries);
                    }
                    return Ok(ctx);
                }
                Err(err)
                    if !err.is_usage_error() && (retries.len() as u32) < self.max_retries =>
                {
                    let attempt = retries.len() as u32;
                    debug!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %err,
                        "Retrying request"
                    );
                    retries.push(Retry {
                        reason: err.to_string(),
                        status_code: err.status_code(),
                    });

                    let delay = self.backoff.delay_for_attempt(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    if self.max_retries > 0 {
                        warn!(
                            attempts = retries.len() + 1,
                            error = %err,
                            "Request failed after all retries"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Run the chain with up to `max_retries` immediate retries.
pub async fn with_retries(chain: &PluginChain, ctx: Context, max_retries: u32) -> Result<Context> {
    RetryPolicy::new(max_retries).execute(chain, ctx).await
}

/// Backoff strategy for retries.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    #[default]
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: delay increases by a fixed amount.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff: delay doubles each attempt.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Exponential backoff doubling from `initial`, capped at 30 seconds.
    pub fn exponential(initial: Duration) -> Self {
        Self::Exponential {
            initial,
            max: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// Calculate delay for a given retry (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => {
                let total = delay.saturating_mul(attempt + 1);
                total.min(*max)
            }
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}
