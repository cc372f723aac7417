//! Response caching middleware for courier.
//!
//! [`ResponseCache`] remembers successful GET responses by URL and answers
//! repeated requests without going to the network. Entries live for a fixed
//! time-to-live (five minutes by default) and the least recently used entry
//! is evicted once the cache is full.
//!
//! # Example
//!
//! ```rust
//! use courier_cache::ResponseCache;
//! use std::time::Duration;
//!
//! let cache = ResponseCache::builder()
//!     .max_size(500)
//!     .ttl(Duration::from_secs(60))
//!     .name("catalog")
//!     .on_hit(|url| println!("served {} from cache", url))
//!     .build();
//!
//! assert!(cache.is_empty());
//! ```
//!
//! # Feature flags
//!
//! - `metrics`: hit/miss counters and a size gauge
//! - `tracing`: hit logging

mod cache;
mod config;
mod events;
mod store;

pub use cache::{is_cacheable, ResponseCache};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use events::CacheEvent;
pub use store::CacheEntry;
