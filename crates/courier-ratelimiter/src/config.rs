use crate::error::RateLimiterError;
use crate::events::RateLimiterEvent;
use crate::limiter::RateLimiter;
use courier_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Highest supported rate; the refill period is one nanosecond at this rate.
pub const MAX_RATE: u32 = 1_000_000_000;

/// Configuration for a [`RateLimiter`].
pub struct RateLimiterConfig {
    pub(crate) rate: u32,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
    pub(crate) name: String,
}

impl RateLimiterConfig {
    /// The refill period, one token per `1 s / rate`.
    pub(crate) fn refill_period(&self) -> Duration {
        Duration::from_secs(1) / self.rate
    }
}

/// Builder for [`RateLimiter`].
pub struct RateLimiterConfigBuilder {
    rate: u32,
    event_listeners: EventListeners<RateLimiterEvent>,
    name: String,
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - rate: 10 requests per second
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            rate: 10,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the number of requests allowed per second.
    ///
    /// This is both the size of the token reservoir (the largest burst) and
    /// the refill rate.
    pub fn rate(mut self, requests_per_second: u32) -> Self {
        self.rate = requests_per_second;
        self
    }

    /// Sets the name for this rate limiter instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a token is taken.
    ///
    /// The callback receives how long the caller waited for it; zero when a
    /// token was immediately available.
    ///
    /// # Example
    /// ```rust,no_run
    /// use courier_ratelimiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), courier_ratelimiter::RateLimiterError> {
    /// let limiter = RateLimiter::builder()
    ///     .rate(100)
    ///     .on_permit_acquired(|wait_time| {
    ///         if wait_time > Duration::ZERO {
    ///             println!("Request waited {:?} for a token", wait_time);
    ///         }
    ///     })
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn on_permit_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitAcquired { wait_duration, .. } = event {
                f(*wait_duration);
            }
        }));
        self
    }

    /// Registers a callback when [`RateLimiter::try_acquire`] finds no token.
    pub fn on_permit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::PermitRejected { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a callback when the limiter is closed.
    pub fn on_closed<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RateLimiterEvent::Closed { .. } = event {
                f();
            }
        }));
        self
    }

    /// Builds the limiter and starts its refill task.
    ///
    /// Fails when the rate is zero or above [`MAX_RATE`], or when called
    /// outside a Tokio runtime.
    pub fn build(self) -> Result<RateLimiter, RateLimiterError> {
        if self.rate == 0 || self.rate > MAX_RATE {
            return Err(RateLimiterError::InvalidRate);
        }
        let config = RateLimiterConfig {
            rate: self.rate,
            event_listeners: self.event_listeners,
            name: self.name,
        };
        RateLimiter::from_config(config)
    }
}
