use courier_core::CourierEvent;
use std::time::Instant;

/// Events emitted by the response cache.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A request was answered from the cache.
    Hit {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
    /// A cacheable request had no live entry.
    Miss {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
    /// A response was stored.
    Stored {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
    /// An entry was evicted to make room.
    Evicted {
        pattern_name: String,
        timestamp: Instant,
        key: String,
    },
}

impl CourierEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Stored { .. } => "stored",
            CacheEvent::Evicted { .. } => "evicted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Stored { timestamp, .. }
            | CacheEvent::Evicted { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. }
            | CacheEvent::Miss { pattern_name, .. }
            | CacheEvent::Stored { pattern_name, .. }
            | CacheEvent::Evicted { pattern_name, .. } => pattern_name,
        }
    }
}
