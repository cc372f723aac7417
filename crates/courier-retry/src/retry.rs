use crate::config::{RetryConfig, RetryConfigBuilder};
use crate::events::RetryEvent;
use courier_core::{HttpResponse, Middleware, Outcome, RequestContext, StatusCode};
#[cfg(feature = "metrics")]
use metrics::counter;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decides whether an outcome is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(Outcome<'_>) -> bool + Send + Sync>;

/// Retries transient failures: any error the taxonomy calls retryable,
/// plus `429 Too Many Requests` and 5xx responses.
pub fn default_retry_predicate(outcome: Outcome<'_>) -> bool {
    match outcome {
        Ok(response) => {
            let status = response.status();
            status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        Err(error) => error.is_retryable(),
    }
}

/// Re-runs the whole pipeline for retryable outcomes.
///
/// The middleware never calls the network itself: it answers the engine's
/// [`retry_after`](Middleware::retry_after) question with the backoff delay
/// until `max_attempts` attempts have been made. Every retry goes through
/// all before-hooks again, so rate limiting, circuit breaking and request
/// signing apply to each attempt.
#[derive(Clone)]
pub struct RetryMiddleware {
    config: Arc<RetryConfig>,
}

impl RetryMiddleware {
    /// Retries up to `max_attempts` attempts in total with the default
    /// exponential backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self::builder().max_attempts(max_attempts).build()
    }

    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    fn delay_for(&self, attempt: u32, outcome: Outcome<'_>) -> Duration {
        let retry_index = attempt.saturating_sub(1) as usize;
        let backoff = self.config.interval_fn.next_interval(retry_index);
        if !self.config.respect_retry_after {
            return backoff;
        }
        match outcome.ok().and_then(retry_after_header) {
            Some(hint) => backoff.max(hint.min(self.config.max_retry_after)),
            None => backoff,
        }
    }
}

/// Reads a `Retry-After` header expressed in whole seconds.
fn retry_after_header(response: &HttpResponse) -> Option<Duration> {
    response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Middleware for RetryMiddleware {
    fn name(&self) -> &str {
        "retry"
    }

    fn retry_after(
        &self,
        attempt: u32,
        outcome: Outcome<'_>,
        ctx: &RequestContext,
    ) -> Option<Duration> {
        let config = &self.config;

        if !(config.retry_predicate)(outcome) {
            if outcome.is_err() {
                config.event_listeners.emit(&RetryEvent::IgnoredError {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                });
            }
            return None;
        }

        if attempt >= config.max_attempts {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                retry = %config.name,
                method = %ctx.method(),
                url = %ctx.url(),
                attempts = attempt,
                "retry attempts exhausted"
            );

            #[cfg(feature = "metrics")]
            counter!("courier_retry_exhausted_total", "retry" => config.name.clone()).increment(1);

            config.event_listeners.emit(&RetryEvent::Exhausted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                attempts: attempt,
            });
            return None;
        }

        let delay = self.delay_for(attempt, outcome);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            retry = %config.name,
            method = %ctx.method(),
            url = %ctx.url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "scheduling retry"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = ctx;

        #[cfg(feature = "metrics")]
        counter!("courier_retry_attempts_total", "retry" => config.name.clone()).increment(1);

        config.event_listeners.emit(&RetryEvent::Retry {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            attempt,
            delay,
        });
        Some(delay)
    }
}

impl fmt::Debug for RetryMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryMiddleware")
            .field("name", &self.config.name)
            .field("max_attempts", &self.config.max_attempts)
            .finish()
    }
}
