//! Built-in middlewares.
//!
//! Resilience middlewares live in their own crates and are re-exported here
//! for convenience: [`RateLimitMiddleware`], [`CircuitBreaker`],
//! [`ResponseCache`] and [`RetryMiddleware`].

mod auth;
mod logging;
mod request_id;
mod request_metrics;
mod user_agent;

pub use auth::{AuthMiddleware, Credentials};
pub use logging::LoggingMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use request_metrics::{MetricsMiddleware, MetricsSnapshot};
pub use user_agent::UserAgentRotation;

pub use courier_cache::ResponseCache;
pub use courier_circuitbreaker::CircuitBreaker;
pub use courier_ratelimiter::RateLimitMiddleware;
pub use courier_retry::RetryMiddleware;
