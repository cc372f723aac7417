//! Adaptive connection pool manager.
//!
//! [`ConnectionPool`] owns the HTTP transport shared by a session and keeps
//! the transport's per-host idle-connection ceiling in step with load. Every
//! [`adjustment_interval`](PoolConfig::adjustment_interval) a monitor task
//! compares active connections with the ceiling:
//!
//! - above `scale_up_threshold` the ceiling grows by half, up to
//!   `max_conns_per_host` (unless that is zero)
//! - below `scale_down_threshold` it shrinks by a fifth, down to
//!   `min_per_host`
//!
//! A new ceiling is written through by rebuilding the transport; handles
//! already taken from [`ConnectionPool::client`] keep working.
//!
//! # Profiles
//!
//! | profile | idle/host | conns/host | adaptive |
//! |---|---|---|---|
//! | [`PoolConfig::default`] | 10 | unlimited | no |
//! | [`PoolConfig::high_performance`] | 20 per core | 50 per core | yes |
//! | [`PoolConfig::low_latency`] | 10 | 20 | yes |
//! | [`PoolConfig::resource_constrained`] | 2 | 5 | no |
//!
//! # Example
//!
//! ```rust,no_run
//! use courier_pool::{ConnectionPool, PoolConfig};
//! use std::time::{Duration, Instant};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = ConnectionPool::new(PoolConfig::high_performance())?;
//!
//! let started = Instant::now();
//! let guard = pool.track();
//! let result = pool.client()?.get("https://example.com").send().await;
//! pool.record_request(result.is_ok(), started.elapsed());
//! drop(guard);
//!
//! println!("{:?}", pool.stats());
//! pool.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `tracing`: log resizes and lifecycle changes
//! - `metrics`: export the idle ceiling, active connections and request
//!   counters
//! - `serde`: (de)serialize [`PoolConfig`]

mod adjust;
mod config;
mod error;
mod events;
mod pool;
mod stats;

pub use adjust::{plan_adjustment, Adjustment, SCALE_DOWN_FACTOR, SCALE_UP_FACTOR};
pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{PoolConfigError, PoolError};
pub use events::PoolEvent;
pub use pool::{ConnectionGuard, ConnectionPool, ConnectionPoolBuilder};
pub use stats::{ConnectionStats, CONNECT_TIME_SMOOTHING};
