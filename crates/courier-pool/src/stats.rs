//! Connection utilization statistics.

use std::time::{Duration, Instant};

/// Smoothing factor of the connect-time moving average.
pub const CONNECT_TIME_SMOOTHING: f64 = 0.1;

/// Point-in-time view of a pool's utilization.
///
/// Snapshots returned by [`ConnectionPool::stats`](crate::ConnectionPool::stats)
/// are copies; they never change after being handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStats {
    /// Exchanges currently holding a connection.
    pub active_connections: usize,
    /// Estimated connections parked in the idle pool.
    pub idle_connections: usize,
    /// Completed exchanges.
    pub total_requests: u64,
    /// Completed exchanges that failed at the transport level.
    pub failed_connections: u64,
    /// Exponential moving average of the time to first response byte.
    pub average_connect_time: Duration,
    /// When the idle ceiling was last changed.
    pub last_adjustment_time: Option<Instant>,
    /// The idle ceiling currently applied to the transport.
    pub max_idle_per_host: usize,
    /// Number of applied rescalings.
    pub adjustments: u64,
}

impl ConnectionStats {
    /// Records one completed exchange.
    pub fn record(&mut self, success: bool, connect_duration: Duration) {
        self.total_requests += 1;
        if !success {
            self.failed_connections += 1;
        }
        self.average_connect_time = if self.average_connect_time.is_zero() {
            connect_duration
        } else {
            let avg = self.average_connect_time.as_secs_f64();
            let sample = connect_duration.as_secs_f64();
            Duration::from_secs_f64(
                (1.0 - CONNECT_TIME_SMOOTHING) * avg + CONNECT_TIME_SMOOTHING * sample,
            )
        };
    }

    /// Ratio of active connections to the idle ceiling, if defined.
    pub fn utilization(&self) -> Option<f64> {
        if self.max_idle_per_host == 0 {
            return None;
        }
        Some(self.active_connections as f64 / self.max_idle_per_host as f64)
    }

    /// Failed share of all completed exchanges.
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.failed_connections as f64 / self.total_requests as f64
        }
    }
}
