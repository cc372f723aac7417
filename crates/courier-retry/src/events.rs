use courier_core::CourierEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry middleware.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// Another attempt was scheduled.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        /// The attempt that just finished (1-based).
        attempt: u32,
        delay: Duration,
    },
    /// The attempt budget ran out on a retryable outcome.
    Exhausted {
        pattern_name: String,
        timestamp: Instant,
        attempts: u32,
    },
    /// A failure was not retried because the predicate rejected it.
    IgnoredError {
        pattern_name: String,
        timestamp: Instant,
        attempt: u32,
    },
}

impl CourierEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Exhausted { pattern_name, .. }
            | RetryEvent::IgnoredError { pattern_name, .. } => pattern_name,
        }
    }
}
