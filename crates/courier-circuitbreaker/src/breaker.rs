use crate::circuit::{Circuit, CircuitState};
use crate::config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
use crate::error::CircuitBreakerError;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A three-state circuit breaker shared by every request of a session.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Shared>,
}

struct Shared {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    /// Creates a breaker that opens after `failure_threshold` consecutive
    /// failures and admits a trial once `reset_timeout` has passed since the
    /// last one.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self::builder()
            .failure_threshold(failure_threshold)
            .reset_timeout(reset_timeout)
            .build()
    }

    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    pub(crate) fn from_config(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                circuit: Mutex::new(Circuit::default()),
            }),
        }
    }

    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.inner
            .circuit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.inner.config
    }

    /// Asks permission for one call.
    ///
    /// In `Open` the call is rejected until the reset timeout has elapsed;
    /// then the breaker moves to `HalfOpen` and this call becomes the trial.
    /// While the trial is in flight every other call is rejected.
    pub fn try_acquire(&self) -> Result<(), CircuitBreakerError> {
        if self.circuit().try_acquire(&self.inner.config) {
            Ok(())
        } else {
            Err(CircuitBreakerError::OpenCircuit)
        }
    }

    /// Records the outcome of an admitted call from its status code.
    ///
    /// Statuses of 500 and above count as failures.
    pub fn record_status(&self, status: u16) {
        if status >= 500 {
            self.record_failure();
        } else {
            self.record_success();
        }
    }

    pub fn record_success(&self) {
        self.circuit().record_success(&self.inner.config);
    }

    pub fn record_failure(&self) {
        self.circuit().record_failure(&self.inner.config);
    }

    /// Gives back an admission that never produced an outcome.
    pub fn release(&self) {
        self.circuit().release_trial();
    }

    pub fn state(&self) -> CircuitState {
        self.circuit().state()
    }

    /// Consecutive failures recorded since the last success.
    pub fn failure_count(&self) -> u32 {
        self.circuit().failure_count()
    }

    pub fn last_failure_time(&self) -> Option<Instant> {
        self.circuit().last_failure_time()
    }

    /// Opens the circuit now, as if a failure had just been recorded.
    pub fn force_open(&self) {
        self.circuit().force_open(&self.inner.config);
    }

    /// Closes the circuit and clears the failure history.
    pub fn reset(&self) {
        self.circuit().reset(&self.inner.config);
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let circuit = self.circuit();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.inner.config.name)
            .field("state", &circuit.state())
            .field("failure_count", &circuit.failure_count())
            .field("failure_threshold", &self.inner.config.failure_threshold)
            .field("reset_timeout", &self.inner.config.reset_timeout)
            .finish()
    }
}
