//! Retry middleware for courier.
//!
//! [`RetryMiddleware`] asks the execution engine to run a request's whole
//! pipeline again when an attempt ends in a transient failure. Attempts are
//! spaced by an [`IntervalFunction`]: fixed, exponential, exponential with
//! jitter, or any closure.
//!
//! # Example
//!
//! ```rust
//! use courier_retry::{ExponentialRandomBackoff, RetryMiddleware};
//! use std::time::Duration;
//!
//! let retry = RetryMiddleware::builder()
//!     .max_attempts(4)
//!     .backoff(ExponentialRandomBackoff::new(Duration::from_millis(50), 0.5))
//!     .on_retry(|attempt, delay| {
//!         println!("attempt {} failed, retrying in {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! assert_eq!(retry.max_attempts(), 4);
//! ```
//!
//! # Feature flags
//!
//! - `metrics`: retry and exhaustion counters
//! - `tracing`: retry scheduling logs

mod backoff;
mod config;
mod events;
mod retry;

pub use backoff::{
    ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction,
};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use retry::{default_retry_predicate, RetryMiddleware, RetryPredicate};
