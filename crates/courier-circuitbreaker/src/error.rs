use courier_core::{ErrorKind, HttpError};
use thiserror::Error;

/// Errors returned by the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitBreakerError {
    /// The circuit is open, or a half-open trial is already in flight.
    #[error("circuit breaker open")]
    OpenCircuit,
}

impl CircuitBreakerError {
    /// Returns true if the error indicates the circuit is open.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CircuitBreakerError::OpenCircuit)
    }
}

impl From<CircuitBreakerError> for HttpError {
    fn from(err: CircuitBreakerError) -> Self {
        HttpError::new(ErrorKind::CircuitOpen, "call rejected").with_source(err)
    }
}
