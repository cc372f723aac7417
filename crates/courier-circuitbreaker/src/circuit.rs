use crate::config::CircuitBreakerConfig;
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::time::Instant as StdInstant;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed,
    /// The circuit is open and calls are rejected.
    Open,
    /// The circuit admits a single trial call.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

pub(crate) struct Circuit {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    trial_started: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            trial_started: None,
        }
    }
}

impl Circuit {
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub(crate) fn last_failure_time(&self) -> Option<Instant> {
        self.last_failure_time
    }

    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = self
                    .last_failure_time
                    .map_or(true, |at| at.elapsed() >= config.reset_timeout);
                if cooled_down {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.trial_started = Some(Instant::now());
                }
                cooled_down
            }
            CircuitState::HalfOpen => {
                // A trial older than the reset timeout is presumed lost.
                let busy = self
                    .trial_started
                    .is_some_and(|at| at.elapsed() < config.reset_timeout);
                if !busy {
                    self.trial_started = Some(Instant::now());
                }
                !busy
            }
        };

        if permitted {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallPermitted {
                    pattern_name: config.name.clone(),
                    timestamp: StdInstant::now(),
                    state: self.state,
                });
        } else {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallRejected {
                    pattern_name: config.name.clone(),
                    timestamp: StdInstant::now(),
                });

            #[cfg(feature = "metrics")]
            counter!("courier_circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "rejected")
                .increment(1);
        }
        permitted
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) {
        self.failure_count = 0;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                pattern_name: config.name.clone(),
                timestamp: StdInstant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        counter!("courier_circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success")
            .increment(1);

        if self.state == CircuitState::HalfOpen {
            self.transition_to(CircuitState::Closed, config);
        }
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_time = Some(Instant::now());

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                pattern_name: config.name.clone(),
                timestamp: StdInstant::now(),
                state: self.state,
                failure_count: self.failure_count,
            });

        #[cfg(feature = "metrics")]
        counter!("courier_circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure")
            .increment(1);

        if self.state == CircuitState::HalfOpen || self.failure_count >= config.failure_threshold {
            self.transition_to(CircuitState::Open, config);
        }
    }

    /// Frees the half-open trial slot without recording an outcome.
    pub(crate) fn release_trial(&mut self) {
        if self.state == CircuitState::HalfOpen {
            self.trial_started = None;
        }
    }

    pub(crate) fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.last_failure_time = Some(Instant::now());
        self.transition_to(CircuitState::Open, config);
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.failure_count = 0;
        self.last_failure_time = None;
        self.transition_to(CircuitState::Closed, config);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        self.trial_started = None;
        if self.state == state {
            return;
        }

        let from_state = self.state;
        self.state = state;
        if state == CircuitState::Closed {
            self.failure_count = 0;
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                pattern_name: config.name.clone(),
                timestamp: StdInstant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(
            circuitbreaker = %config.name,
            from = from_state.as_str(),
            to = state.as_str(),
            failure_count = self.failure_count,
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(
                "courier_circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            let value = match state {
                CircuitState::Closed => 0.0,
                CircuitState::Open => 1.0,
                CircuitState::HalfOpen => 2.0,
            };
            gauge!("courier_circuitbreaker_state", "circuitbreaker" => config.name.clone())
                .set(value);
        }
    }
}
