use courier_core::events::CourierEvent;
use std::time::Instant;

/// Events emitted by a connection pool.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// The idle ceiling was changed and written through to the transport.
    Resized {
        pattern_name: String,
        timestamp: Instant,
        from: usize,
        to: usize,
        utilization: f64,
    },
    /// A proposed resize fell outside the configured bounds and was dropped.
    ResizeRejected {
        pattern_name: String,
        timestamp: Instant,
        current: usize,
        proposed: usize,
        utilization: f64,
    },
    /// The pool was closed.
    Closed {
        pattern_name: String,
        timestamp: Instant,
    },
}

impl CourierEvent for PoolEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PoolEvent::Resized { .. } => "resized",
            PoolEvent::ResizeRejected { .. } => "resize_rejected",
            PoolEvent::Closed { .. } => "closed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PoolEvent::Resized { timestamp, .. }
            | PoolEvent::ResizeRejected { timestamp, .. }
            | PoolEvent::Closed { timestamp, .. } => *timestamp,
        }
    }

    fn component_name(&self) -> &str {
        match self {
            PoolEvent::Resized { pattern_name, .. }
            | PoolEvent::ResizeRejected { pattern_name, .. }
            | PoolEvent::Closed { pattern_name, .. } => pattern_name,
        }
    }
}
