//! Pool tunables and named profiles.

use crate::error::PoolConfigError;
use std::time::Duration;

/// Tunables for a [`ConnectionPool`](crate::ConnectionPool).
///
/// Only the adjustment routine rewrites `max_idle_per_host` once a pool has
/// been built; every other field is fixed for the lifetime of the pool.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Upper bound on idle connections across all hosts (informational; the
    /// transport only enforces the per-host ceiling).
    pub max_idle_total: usize,
    /// Idle connections kept per host. Rescaled by the adaptive loop.
    pub max_idle_per_host: usize,
    /// Ceiling for scale-up proposals. `0` means unlimited.
    pub max_conns_per_host: usize,
    /// How long an idle connection is kept before it is closed.
    pub idle_timeout: Duration,
    /// TCP connect timeout.
    pub dial_timeout: Duration,
    /// TLS handshake budget, added to the dial timeout.
    pub handshake_timeout: Duration,
    /// Whether the background adjustment loop runs.
    pub adaptive_enabled: bool,
    /// Floor for scale-down proposals.
    pub min_per_host: usize,
    /// Utilization above which the idle ceiling grows (0.0 to 1.0).
    pub scale_up_threshold: f64,
    /// Utilization below which the idle ceiling shrinks (0.0 to 1.0).
    pub scale_down_threshold: f64,
    /// Period of the adjustment loop.
    pub adjustment_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_total: 100,
            max_idle_per_host: 10,
            max_conns_per_host: 0,
            idle_timeout: Duration::from_secs(90),
            dial_timeout: Duration::from_secs(30),
            handshake_timeout: Duration::from_secs(10),
            adaptive_enabled: false,
            min_per_host: 2,
            scale_up_threshold: 0.8,
            scale_down_threshold: 0.3,
            adjustment_interval: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Returns a builder starting from [`PoolConfig::default`].
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new(Self::default())
    }

    /// Large pools sized by the number of available CPU cores, with adaptive
    /// scaling on tighter thresholds (0.7 / 0.2).
    pub fn high_performance() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_idle_total: 200 * cpus,
            max_idle_per_host: 20 * cpus,
            max_conns_per_host: 50 * cpus,
            idle_timeout: Duration::from_secs(120),
            dial_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(5),
            adaptive_enabled: true,
            min_per_host: 5,
            scale_up_threshold: 0.7,
            scale_down_threshold: 0.2,
            ..Self::default()
        }
    }

    /// Short timeouts and warm connections for latency-sensitive callers.
    pub fn low_latency() -> Self {
        Self {
            max_idle_total: 50,
            max_idle_per_host: 10,
            max_conns_per_host: 20,
            idle_timeout: Duration::from_secs(30),
            dial_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(3),
            adaptive_enabled: true,
            min_per_host: 5,
            ..Self::default()
        }
    }

    /// Few connections and no background work.
    pub fn resource_constrained() -> Self {
        Self {
            max_idle_total: 20,
            max_idle_per_host: 2,
            max_conns_per_host: 5,
            idle_timeout: Duration::from_secs(30),
            adaptive_enabled: false,
            min_per_host: 1,
            scale_up_threshold: 0.9,
            scale_down_threshold: 0.1,
            ..Self::default()
        }
    }

    /// Combined connect budget handed to the transport (TCP plus TLS).
    pub fn connect_timeout(&self) -> Duration {
        self.dial_timeout + self.handshake_timeout
    }

    /// Checks the invariants between fields.
    pub fn validate(&self) -> Result<(), PoolConfigError> {
        for (name, value) in [
            ("scale_up_threshold", self.scale_up_threshold),
            ("scale_down_threshold", self.scale_down_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PoolConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.scale_down_threshold >= self.scale_up_threshold {
            return Err(PoolConfigError::InvertedThresholds {
                down: self.scale_down_threshold,
                up: self.scale_up_threshold,
            });
        }
        if self.min_per_host > self.max_idle_per_host {
            return Err(PoolConfigError::MinAboveMax {
                min: self.min_per_host,
                max: self.max_idle_per_host,
            });
        }
        if self.adaptive_enabled && self.adjustment_interval.is_zero() {
            return Err(PoolConfigError::ZeroInterval);
        }
        Ok(())
    }
}

/// Builder for [`PoolConfig`].
#[derive(Debug, Clone)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Starts from an existing configuration, for example a profile.
    pub fn new(config: PoolConfig) -> Self {
        Self { config }
    }

    pub fn max_idle_total(mut self, value: usize) -> Self {
        self.config.max_idle_total = value;
        self
    }

    pub fn max_idle_per_host(mut self, value: usize) -> Self {
        self.config.max_idle_per_host = value;
        self
    }

    /// Sets the scale-up ceiling. `0` disables the ceiling.
    pub fn max_conns_per_host(mut self, value: usize) -> Self {
        self.config.max_conns_per_host = value;
        self
    }

    pub fn idle_timeout(mut self, value: Duration) -> Self {
        self.config.idle_timeout = value;
        self
    }

    pub fn dial_timeout(mut self, value: Duration) -> Self {
        self.config.dial_timeout = value;
        self
    }

    pub fn handshake_timeout(mut self, value: Duration) -> Self {
        self.config.handshake_timeout = value;
        self
    }

    pub fn adaptive(mut self, enabled: bool) -> Self {
        self.config.adaptive_enabled = enabled;
        self
    }

    pub fn min_per_host(mut self, value: usize) -> Self {
        self.config.min_per_host = value;
        self
    }

    /// Sets both utilization thresholds.
    pub fn thresholds(mut self, scale_down: f64, scale_up: f64) -> Self {
        self.config.scale_down_threshold = scale_down;
        self.config.scale_up_threshold = scale_up;
        self
    }

    pub fn adjustment_interval(mut self, value: Duration) -> Self {
        self.config.adjustment_interval = value;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<PoolConfig, PoolConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
