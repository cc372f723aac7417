use crate::config::{RateLimiterConfig, RateLimiterConfigBuilder};
use crate::error::RateLimiterError;
use crate::events::RateLimiterEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;

/// A token-bucket rate limiter.
///
/// The reservoir starts full with `rate` tokens. A background task deposits
/// one token every `1 s / rate` and discards it when the reservoir is full.
/// Cloning is cheap; clones share the reservoir.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

struct Inner {
    config: RateLimiterConfig,
    tokens: Arc<Semaphore>,
    refill: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second`.
    pub fn new(requests_per_second: u32) -> Result<Self, RateLimiterError> {
        Self::builder().rate(requests_per_second).build()
    }

    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    pub(crate) fn from_config(config: RateLimiterConfig) -> Result<Self, RateLimiterError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| RateLimiterError::NoRuntime)?;

        let capacity = config.rate as usize;
        let period = config.refill_period();
        let tokens = Arc::new(Semaphore::new(capacity));

        let reservoir = Arc::clone(&tokens);
        let refill = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if reservoir.is_closed() {
                    break;
                }
                // Only this task adds tokens, so the check cannot race.
                if reservoir.available_permits() < capacity {
                    reservoir.add_permits(1);
                }
            }
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(limiter = %config.name, rate = config.rate, "rate limiter started");

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                tokens,
                refill: Mutex::new(Some(refill)),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Waits for a token.
    ///
    /// Returns [`RateLimiterError::Closed`] if the limiter is closed before or
    /// while waiting. Dropping the future gives up the place in the queue.
    pub async fn acquire(&self) -> Result<(), RateLimiterError> {
        let started = tokio::time::Instant::now();
        let permit = self
            .inner
            .tokens
            .acquire()
            .await
            .map_err(|_| RateLimiterError::Closed)?;
        permit.forget();

        let wait_duration = started.elapsed();

        #[cfg(feature = "metrics")]
        {
            counter!("courier_ratelimiter_calls_total", "ratelimiter" => self.inner.config.name.clone(), "result" => "permitted")
                .increment(1);
            histogram!("courier_ratelimiter_wait_duration_seconds", "ratelimiter" => self.inner.config.name.clone())
                .record(wait_duration.as_secs_f64());
        }

        #[cfg(feature = "tracing")]
        if !wait_duration.is_zero() {
            tracing::trace!(
                limiter = %self.inner.config.name,
                wait_ms = wait_duration.as_millis() as u64,
                "token acquired after waiting"
            );
        }

        self.inner
            .config
            .event_listeners
            .emit(&RateLimiterEvent::PermitAcquired {
                pattern_name: self.inner.config.name.clone(),
                timestamp: Instant::now(),
                wait_duration,
            });
        Ok(())
    }

    /// Takes a token if one is available right now.
    pub fn try_acquire(&self) -> Result<(), RateLimiterError> {
        match self.inner.tokens.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.inner
                    .config
                    .event_listeners
                    .emit(&RateLimiterEvent::PermitAcquired {
                        pattern_name: self.inner.config.name.clone(),
                        timestamp: Instant::now(),
                        wait_duration: std::time::Duration::ZERO,
                    });
                Ok(())
            }
            Err(TryAcquireError::Closed) => Err(RateLimiterError::Closed),
            Err(TryAcquireError::NoPermits) => {
                #[cfg(feature = "metrics")]
                counter!("courier_ratelimiter_calls_total", "ratelimiter" => self.inner.config.name.clone(), "result" => "rejected")
                    .increment(1);

                self.inner
                    .config
                    .event_listeners
                    .emit(&RateLimiterEvent::PermitRejected {
                        pattern_name: self.inner.config.name.clone(),
                        timestamp: Instant::now(),
                    });
                Err(RateLimiterError::RateLimitExceeded)
            }
        }
    }

    /// Tokens currently in the reservoir. Zero once closed.
    pub fn available_tokens(&self) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.inner.tokens.available_permits()
    }

    /// The configured requests per second.
    pub fn rate(&self) -> u32 {
        self.inner.config.rate
    }

    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stops the refill task and wakes every waiter with
    /// [`RateLimiterError::Closed`].
    ///
    /// Safe to call any number of times.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.stop_refill();
        self.inner.tokens.close();

        #[cfg(feature = "tracing")]
        tracing::debug!(limiter = %self.inner.config.name, "rate limiter closed");

        self.inner
            .config
            .event_listeners
            .emit(&RateLimiterEvent::Closed {
                pattern_name: self.inner.config.name.clone(),
                timestamp: Instant::now(),
            });
    }
}

impl Inner {
    fn stop_refill(&self) {
        let task = self
            .refill
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_refill();
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.inner.config.name)
            .field("rate", &self.inner.config.rate)
            .field("available_tokens", &self.available_tokens())
            .field("closed", &self.is_closed())
            .finish()
    }
}
