//! Error types for the connection pool.

use courier_core::{ErrorKind, HttpError};

/// Invalid combinations of [`PoolConfig`](crate::PoolConfig) fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoolConfigError {
    #[error("{name} must be within 0.0..=1.0, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
    #[error("scale_down_threshold ({down}) must be below scale_up_threshold ({up})")]
    InvertedThresholds { down: f64, up: f64 },
    #[error("min_per_host ({min}) exceeds max_idle_per_host ({max})")]
    MinAboveMax { min: usize, max: usize },
    #[error("adjustment_interval must be non-zero when adaptive scaling is enabled")]
    ZeroInterval,
}

/// Errors returned by [`ConnectionPool`](crate::ConnectionPool).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The configuration failed validation.
    #[error("invalid pool configuration: {0}")]
    Config(#[from] PoolConfigError),
    /// The underlying transport could not be built.
    #[error("failed to build transport")]
    Transport(#[source] reqwest::Error),
    /// Adaptive scaling needs a Tokio runtime to host the monitor task.
    #[error("adaptive pool requires a running Tokio runtime")]
    NoRuntime,
    /// The pool was closed.
    #[error("connection pool is closed")]
    Closed,
}

impl From<PoolError> for HttpError {
    fn from(err: PoolError) -> Self {
        let kind = match err {
            PoolError::Config(_) => ErrorKind::Validation,
            PoolError::Transport(_) | PoolError::NoRuntime | PoolError::Closed => {
                ErrorKind::Internal
            }
        };
        HttpError::new(kind, "connection pool unavailable").with_source(err)
    }
}
