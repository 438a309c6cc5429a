//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: after break duration
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails (timer restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per gateway, shared by every caller of that gateway
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial call in Half-Open; concurrent callers are rejected
//! - Outcomes are reported through a `Permit`; dropping an unreported permit
//!   counts as a failure so a cancelled trial cannot wedge Half-Open
//! - A permit only affects the generation it was issued in. A slow call
//!   admitted before the circuit opened cannot close or reopen it later, and
//!   in Half-Open only the trial's outcome counts

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Returned when the breaker refuses a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit open, retry in {retry_after:?}")]
pub struct CircuitOpen {
    pub retry_after: Duration,
}

#[derive(Debug)]
enum Phase {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen { trial_in_flight: bool },
}

/// Phase plus a generation that advances on every Open and Closed entry.
/// Permits remember the generation they were issued in; reports from an
/// earlier generation are ignored.
#[derive(Debug)]
struct Inner {
    phase: Phase,
    generation: u64,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    break_duration: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, break_duration: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            break_duration,
            inner: Mutex::new(Inner {
                phase: Phase::Closed { failures: 0 },
                generation: 0,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, config.break_duration())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state. An Open breaker whose break has elapsed reports Half-Open.
    pub fn state(&self) -> CircuitState {
        match self.lock().phase {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { until } if Instant::now() >= until => CircuitState::HalfOpen,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Consecutive failures counted while Closed.
    pub fn failure_count(&self) -> u32 {
        match self.lock().phase {
            Phase::Closed { failures } => failures,
            _ => self.failure_threshold,
        }
    }

    /// Ask permission to make a call.
    pub fn try_acquire(&self) -> Result<Permit<'_>, CircuitOpen> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let now = Instant::now();

        let trial = match inner.phase {
            Phase::Closed { .. } => false,
            Phase::Open { until } => {
                if now < until {
                    return Err(CircuitOpen {
                        retry_after: until - now,
                    });
                }
                tracing::info!("Circuit half-open, admitting trial call");
                metrics::record_circuit_transition(CircuitState::HalfOpen.as_str());
                inner.phase = Phase::HalfOpen {
                    trial_in_flight: true,
                };
                true
            }
            Phase::HalfOpen {
                ref mut trial_in_flight,
            } => {
                if *trial_in_flight {
                    return Err(CircuitOpen {
                        retry_after: Duration::ZERO,
                    });
                }
                *trial_in_flight = true;
                true
            }
        };

        Ok(Permit {
            breaker: self,
            generation: inner.generation,
            trial,
            reported: false,
        })
    }

    fn on_success(&self, generation: u64, trial: bool) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.generation != generation {
            tracing::debug!("Ignoring success reported from an earlier circuit generation");
            return;
        }
        match inner.phase {
            Phase::Closed { ref mut failures } => *failures = 0,
            Phase::HalfOpen { .. } if trial => {
                tracing::info!("Circuit reset");
                metrics::record_circuit_transition(CircuitState::Closed.as_str());
                inner.phase = Phase::Closed { failures: 0 };
                inner.generation += 1;
            }
            _ => {}
        }
    }

    fn on_failure(&self, generation: u64, trial: bool) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.generation != generation {
            tracing::debug!("Ignoring failure reported from an earlier circuit generation");
            return;
        }
        let should_trip = match inner.phase {
            Phase::Closed { ref mut failures } => {
                *failures += 1;
                *failures >= self.failure_threshold
            }
            Phase::HalfOpen { .. } => trial,
            Phase::Open { .. } => false,
        };
        if should_trip {
            self.trip(inner);
        }
    }

    /// Give back a permit whose call never reached the backend.
    fn on_release(&self, generation: u64, trial: bool) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.generation != generation || !trial {
            return;
        }
        if let Phase::HalfOpen {
            ref mut trial_in_flight,
        } = inner.phase
        {
            *trial_in_flight = false;
        }
    }

    fn trip(&self, inner: &mut Inner) {
        tracing::warn!(
            break_duration = ?self.break_duration,
            "Circuit opened"
        );
        metrics::record_circuit_transition(CircuitState::Open.as_str());
        inner.phase = Phase::Open {
            until: Instant::now() + self.break_duration,
        };
        inner.generation += 1;
    }
}

/// Permission to make one call. Report the outcome with `success` or
/// `failure`, or `release` it when the call never left the process.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    trial: bool,
    reported: bool,
}

impl Permit<'_> {
    /// True for the single Half-Open trial call.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn success(mut self) {
        self.reported = true;
        self.breaker.on_success(self.generation, self.trial);
    }

    pub fn failure(mut self) {
        self.reported = true;
        self.breaker.on_failure(self.generation, self.trial);
    }

    /// Record no outcome. A released trial lets the next caller try.
    pub fn release(mut self) {
        self.reported = true;
        self.breaker.on_release(self.generation, self.trial);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.reported {
            tracing::debug!("Circuit permit dropped without outcome, counting as failure");
            self.breaker.on_failure(self.generation, self.trial);
        }
    }
}
