//! Three-state circuit breaker for courier sessions.
//!
//! The breaker stops a session from hammering an upstream that keeps
//! failing:
//!
//! - **Closed**: calls pass through. Every response with a status of 500 or
//!   above (and every transport failure) increments a consecutive-failure
//!   counter; any other response resets it. Reaching `failure_threshold`
//!   opens the circuit.
//! - **Open**: calls fail fast with an
//!   [`ErrorKind::CircuitOpen`](courier_core::ErrorKind::CircuitOpen) error
//!   and never reach the network. Once `reset_timeout` has passed since the
//!   last failure the next call is let through as a trial.
//! - **HalfOpen**: exactly one trial is in flight; concurrent calls are
//!   rejected. A successful trial closes the circuit, a failed one opens it
//!   again.
//!
//! # Example
//!
//! ```rust
//! use courier_circuitbreaker::{CircuitBreaker, CircuitState};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::builder()
//!     .failure_threshold(5)
//!     .reset_timeout(Duration::from_secs(30))
//!     .name("payments")
//!     .on_state_transition(|from, to| {
//!         println!("payments circuit {:?} -> {:?}", from, to);
//!     })
//!     .build();
//!
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! ```
//!
//! `CircuitBreaker` implements [`courier_core::Middleware`], so a clone can be
//! attached to a session directly while the original stays around for
//! inspection.
//!
//! # Feature flags
//!
//! - `metrics`: state gauge, transition and call counters
//! - `tracing`: state transition logging
//! - `serde`: (de)serialize [`CircuitState`]

mod breaker;
mod circuit;
mod config;
mod error;
mod events;
mod middleware;

pub use breaker::CircuitBreaker;
pub use circuit::CircuitState;
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
