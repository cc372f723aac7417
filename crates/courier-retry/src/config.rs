use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::retry::{default_retry_predicate, RetryMiddleware, RetryPredicate};
use courier_core::events::{EventListeners, FnListener};
use courier_core::Outcome;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry middleware.
pub struct RetryConfig {
    pub(crate) max_attempts: u32,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: RetryPredicate,
    pub(crate) respect_retry_after: bool,
    pub(crate) max_retry_after: Duration,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

/// Builder for [`RetryMiddleware`].
pub struct RetryConfigBuilder {
    max_attempts: u32,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate>,
    respect_retry_after: bool,
    max_retry_after: Duration,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3 (the first call plus two retries)
    /// - backoff: exponential from 100ms
    /// - retry on: network errors, timeouts, 429 and 5xx responses
    /// - honors a `Retry-After` header given in seconds, up to 60s
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            interval_fn: None,
            retry_predicate: None,
            respect_retry_after: true,
            max_retry_after: Duration::from_secs(60),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the total number of attempts, including the first one.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Waits the same duration before every retry.
    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Doubles the wait before every retry, starting at `initial_interval`.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Uses a custom interval function.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Decides which outcomes are retried.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Outcome<'_>) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Whether a `Retry-After` header (in seconds) may lengthen the backoff.
    pub fn respect_retry_after(mut self, enabled: bool) -> Self {
        self.respect_retry_after = enabled;
        self
    }

    /// Longest wait a `Retry-After` header may ask for. Larger hints are
    /// clamped to this value.
    pub fn max_retry_after(mut self, max: Duration) -> Self {
        self.max_retry_after = max;
        self
    }

    /// Sets the name for this retry instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a retry is scheduled, with the finished
    /// attempt number and the delay.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when the attempt budget is exhausted.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when a failure is not retryable.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { attempt, .. } = event {
                f(*attempt);
            }
        }));
        self
    }

    pub fn build(self) -> RetryMiddleware {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(Duration::from_millis(100))));
        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Arc::new(default_retry_predicate));

        RetryMiddleware::from_config(RetryConfig {
            max_attempts: self.max_attempts,
            interval_fn,
            retry_predicate,
            respect_retry_after: self.respect_retry_after,
            max_retry_after: self.max_retry_after,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
