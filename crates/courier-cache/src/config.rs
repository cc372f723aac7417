use crate::events::CacheEvent;
use crate::ResponseCache;
use courier_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for the response cache.
pub struct CacheConfig {
    pub(crate) max_size: usize,
    pub(crate) ttl: Duration,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

/// Builder for [`ResponseCache`].
pub struct CacheConfigBuilder {
    max_size: usize,
    ttl: Duration,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_size: 1000 entries
    /// - ttl: 5 minutes
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_size: 1000,
            ttl: Duration::from_secs(300),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the maximum number of cached responses.
    ///
    /// The least recently used entry is evicted when the cache is full.
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Sets how long a stored response is served.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the name for this cache instance (used in events).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for cache hits, with the request URL.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Hit { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback for cache misses, with the request URL.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Miss { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    /// Registers a callback for evictions, with the evicted URL.
    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Evicted { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    pub fn build(self) -> ResponseCache {
        ResponseCache::from_config(CacheConfig {
            max_size: self.max_size,
            ttl: self.ttl,
            event_listeners: self.event_listeners,
            name: self.name,
        })
    }
}
