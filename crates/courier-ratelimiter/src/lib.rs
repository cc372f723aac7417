//! Token-bucket rate limiting for courier sessions.
//!
//! [`RateLimiter`] keeps a reservoir of `rate` tokens refilled one at a time
//! every `1 s / rate`. [`RateLimitMiddleware`] makes every request take a
//! token before it reaches the network, so a session never issues more than
//! `rate` requests per second after its initial burst.
//!
//! # Basic Example
//!
//! ```rust,no_run
//! use courier_ratelimiter::{RateLimitMiddleware, RateLimiter};
//!
//! # async fn example() -> Result<(), courier_ratelimiter::RateLimiterError> {
//! let limiter = RateLimiter::builder()
//!     .rate(20)
//!     .name("search-api")
//!     .build()?;
//!
//! limiter.acquire().await?;
//!
//! let middleware = RateLimitMiddleware::new(limiter.clone());
//! # let _ = middleware;
//!
//! // Wakes anyone still waiting with `RateLimiterError::Closed`.
//! limiter.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `metrics`: permit counters and a wait-time histogram
//! - `tracing`: lifecycle and wait logging

mod config;
mod error;
mod events;
mod limiter;
mod middleware;

pub use config::{RateLimiterConfig, RateLimiterConfigBuilder, MAX_RATE};
pub use error::RateLimiterError;
pub use events::RateLimiterEvent;
pub use limiter::RateLimiter;
pub use middleware::RateLimitMiddleware;
