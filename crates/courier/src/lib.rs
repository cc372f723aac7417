//! HTTP client sessions with an adaptive connection pool and a middleware
//! pipeline.
//!
//! A [`Session`] owns a [`ConnectionPool`] and an ordered list of
//! middlewares. Every request described by a [`RequestSpec`] runs through
//! the session's middlewares, then its own, in insertion order; responses
//! travel back through them in reverse.
//!
//! # Example
//!
//! ```rust,no_run
//! use courier::middleware::{
//!     CircuitBreaker, LoggingMiddleware, MetricsMiddleware, RateLimitMiddleware,
//!     RequestIdMiddleware, RetryMiddleware,
//! };
//! use courier::{PoolConfig, RateLimiter, Session};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = MetricsMiddleware::new();
//! let session = Session::builder()
//!     .pool_config(PoolConfig::high_performance())
//!     .timeout(Duration::from_secs(10))
//!     .middleware(LoggingMiddleware::new())
//!     .middleware(metrics.clone())
//!     .middleware(RequestIdMiddleware::new())
//!     .middleware(RateLimitMiddleware::new(RateLimiter::new(50)?))
//!     .middleware(CircuitBreaker::new(5, Duration::from_secs(30)))
//!     .middleware(RetryMiddleware::new(3))
//!     .build()?;
//!
//! let response = session
//!     .execute(session.get("https://api.example.com/status"))
//!     .await?
//!     .error_for_status()?;
//! println!("{} in {:?}", response.status(), response.elapsed());
//! println!("{:?}", metrics.snapshot());
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! Each concern lives in its own crate, re-exported here:
//!
//! - [`core`]: errors, events, the [`Middleware`] contract
//! - [`pool`]: pool configuration profiles and the adaptive pool
//! - [`ratelimiter`]: token-bucket rate limiter
//! - [`circuitbreaker`]: three-state circuit breaker
//! - [`cache`]: in-memory response cache
//! - [`retry`]: retry middleware and backoff functions
//!
//! # Feature flags
//!
//! - `metrics`: report through the `metrics` facade in every crate
//! - `serde`: (de)serialize `PoolConfig` and `CircuitState`

mod batch;
mod engine;
pub mod middleware;
mod request;
mod service;
mod session;

pub use batch::BatchRunner;
pub use request::RequestSpec;
pub use session::{Session, SessionBuilder};

pub use courier_cache as cache;
pub use courier_circuitbreaker as circuitbreaker;
pub use courier_core as core;
pub use courier_pool as pool;
pub use courier_ratelimiter as ratelimiter;
pub use courier_retry as retry;

pub use courier_circuitbreaker::CircuitState;
pub use courier_core::{
    ErrorKind, Flow, HttpError, HttpResponse, Method, Middleware, Phase, RequestContext,
    SharedMiddleware, StatusCode,
};
pub use courier_pool::{ConnectionPool, ConnectionStats, PoolConfig};
pub use courier_ratelimiter::RateLimiter;
