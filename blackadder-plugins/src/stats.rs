//! Request count and timing plugins, and the sinks they report to.

use async_trait::async_trait;
use blackadder_http_client::{Context, Next, Plugin, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Receiver of counters and timings.
pub trait StatsSink: Send + Sync {
    /// Increment the counter `name` by one.
    fn increment(&self, name: &str);

    /// Record a timing for `name`.
    fn timing(&self, name: &str, value: Duration);
}

/// Name prefix shared by the stats plugins: `http`, or `<name>.<feed>`.
#[derive(Debug, Clone)]
struct Prefix {
    name: String,
    feed: Option<String>,
}

impl Default for Prefix {
    fn default() -> Self {
        Self {
            name: "http".to_string(),
            feed: None,
        }
    }
}

impl Prefix {
    fn metric(&self, suffix: &str) -> String {
        match &self.feed {
            Some(feed) => format!("{}.{}.{}", self.name, feed, suffix),
            None => format!("{}.{}", self.name, suffix),
        }
    }
}

/// Reports every completed call: `<prefix>.requests`,
/// `<prefix>.responses.<status>` and the `<prefix>.response_time` timing.
#[derive(Clone)]
pub struct Stats {
    sink: Arc<dyn StatsSink>,
    prefix: Prefix,
}

impl Stats {
    /// Report to `sink` under the `http` prefix.
    pub fn new(sink: Arc<dyn StatsSink>) -> Self {
        Self {
            sink,
            prefix: Prefix::default(),
        }
    }

    /// Replace the `http` part of the prefix.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.prefix.name = name.into();
        self
    }

    /// Report under `<name>.<feed>`.
    pub fn feed(mut self, feed: impl Into<String>) -> Self {
        self.prefix.feed = Some(feed.into());
        self
    }
}

#[async_trait]
impl Plugin for Stats {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        next.run(ctx).await?;

        if let Some(res) = ctx.res() {
            self.sink.increment(&self.prefix.metric("requests"));
            self.sink
                .increment(&self.prefix.metric(&format!("responses.{}", res.status_code())));
            self.sink
                .timing(&self.prefix.metric("response_time"), res.elapsed());
        }
        Ok(())
    }
}

/// Counts every attempt, successful or not, as `<prefix>.attempts`.
///
/// Attached to a retried call it sees each attempt, since retries re-run the
/// whole pipeline.
#[derive(Clone)]
pub struct AttemptStats {
    sink: Arc<dyn StatsSink>,
    prefix: Prefix,
}

impl AttemptStats {
    /// Report to `sink` under the `http` prefix.
    pub fn new(sink: Arc<dyn StatsSink>) -> Self {
        Self {
            sink,
            prefix: Prefix::default(),
        }
    }

    /// Replace the `http` part of the prefix.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.prefix.name = name.into();
        self
    }

    /// Report under `<name>.<feed>`.
    pub fn feed(mut self, feed: impl Into<String>) -> Self {
        self.prefix.feed = Some(feed.into());
        self
    }
}

#[async_trait]
impl Plugin for AttemptStats {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<()> {
        let outcome = next.run(ctx).await;
        self.sink.increment(&self.prefix.metric("attempts"));
        outcome
    }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemoryStats {
    counters: Mutex<HashMap<String, u64>>,
    timings: Mutex<HashMap<String, Vec<Duration>>>,
}

impl MemoryStats {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if never incremented.
    pub fn count(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    /// Timings recorded for `name`, oldest first.
    pub fn timings(&self, name: &str) -> Vec<Duration> {
        self.timings.lock().get(name).cloned().unwrap_or_default()
    }

    /// Snapshot of every counter.
    pub fn counters(&self) -> HashMap<String, u64> {
        self.counters.lock().clone()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.counters.lock().clear();
        self.timings.lock().clear();
    }
}

impl StatsSink for MemoryStats {
    fn increment(&self, name: &str) {
        *self.counters.lock().entry(name.to_string()).or_insert(0) += 1;
    }

    fn timing(&self, name: &str, value: Duration) {
        self.timings
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(value);
    }
}

#[cfg(feature = "prometheus")]
mod prometheus_sink {
    use super::StatsSink;
    use parking_lot::Mutex;
    use prometheus::{Counter, Histogram, HistogramOpts, Registry};
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;
    use tracing::warn;

    /// Sink registering one prometheus metric per stats name.
    ///
    /// Dotted names map to underscores (`http.users.requests` becomes
    /// `http_users_requests`); timings become histograms in seconds with a
    /// `_seconds` suffix. Names mapping to the same metric share it. A name
    /// the registry refuses is reported once and ignored afterwards.
    pub struct PrometheusStats {
        registry: Registry,
        counters: Mutex<HashMap<String, Counter>>,
        histograms: Mutex<HashMap<String, Histogram>>,
        rejected: Mutex<HashSet<String>>,
    }

    impl PrometheusStats {
        /// Create a sink with its own registry.
        pub fn new() -> Self {
            Self::with_registry(Registry::new())
        }

        /// Create a sink registering into `registry`.
        pub fn with_registry(registry: Registry) -> Self {
            Self {
                registry,
                counters: Mutex::new(HashMap::new()),
                histograms: Mutex::new(HashMap::new()),
                rejected: Mutex::new(HashSet::new()),
            }
        }

        /// Get the registry metrics are registered in.
        pub fn registry(&self) -> &Registry {
            &self.registry
        }

        /// Current value of the counter for a stats name.
        pub fn counter_value(&self, name: &str) -> Option<f64> {
            self.counters.lock().get(&metric_name(name)).map(Counter::get)
        }

        /// Number of timings observed for a stats name.
        pub fn timing_count(&self, name: &str) -> Option<u64> {
            self.histograms
                .lock()
                .get(&format!("{}_seconds", metric_name(name)))
                .map(Histogram::get_sample_count)
        }

        /// Check whether the registry refused the metric for a stats name.
        pub fn is_rejected(&self, name: &str) -> bool {
            let metric = metric_name(name);
            let rejected = self.rejected.lock();
            rejected.contains(&metric) || rejected.contains(&format!("{metric}_seconds"))
        }

        fn reject(&self, metric: String, err: prometheus::Error, kind: &str) {
            if self.rejected.lock().insert(metric.clone()) {
                warn!(metric = %metric, error = %err, "Failed to register stats {kind}");
            }
        }

        fn register_counter(&self, metric: &str, name: &str) -> prometheus::Result<Counter> {
            let counter = Counter::new(metric, format!("Count of {name}"))?;
            self.registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        }

        fn register_histogram(&self, metric: &str, name: &str) -> prometheus::Result<Histogram> {
            let opts = HistogramOpts::new(metric, format!("Timing of {name} in seconds"));
            let histogram = Histogram::with_opts(opts)?;
            self.registry.register(Box::new(histogram.clone()))?;
            Ok(histogram)
        }
    }

    impl Default for PrometheusStats {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StatsSink for PrometheusStats {
        fn increment(&self, name: &str) {
            let metric = metric_name(name);
            let mut counters = self.counters.lock();
            if let Some(counter) = counters.get(&metric) {
                counter.inc();
                return;
            }
            if self.rejected.lock().contains(&metric) {
                return;
            }
            match self.register_counter(&metric, name) {
                Ok(counter) => {
                    counter.inc();
                    counters.insert(metric, counter);
                }
                Err(err) => self.reject(metric, err, "counter"),
            }
        }

        fn timing(&self, name: &str, value: Duration) {
            let metric = format!("{}_seconds", metric_name(name));
            let mut histograms = self.histograms.lock();
            if let Some(histogram) = histograms.get(&metric) {
                histogram.observe(value.as_secs_f64());
                return;
            }
            if self.rejected.lock().contains(&metric) {
                return;
            }
            match self.register_histogram(&metric, name) {
                Ok(histogram) => {
                    histogram.observe(value.as_secs_f64());
                    histograms.insert(metric, histogram);
                }
                Err(err) => self.reject(metric, err, "histogram"),
            }
        }
    }

    /// Prometheus-safe form of a stats name.
    pub(crate) fn metric_name(name: &str) -> String {
        let mut metric: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' })
            .collect();
        if metric.starts_with(|c: char| c.is_ascii_digit()) {
            metric.insert(0, '_');
        }
        metric
    }
}

#[cfg(feature = "prometheus")]
pub use prometheus_sink::PrometheusStats;
