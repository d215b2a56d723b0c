//! Generic circuit breaker state machine.
//!
//! Three states: Closed (normal), Open (failing fast), HalfOpen (probing
//! recovery). Transitions are driven by `record_success`/`record_failure`
//! and by `should_allow` checking whether the recovery timeout has elapsed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::behavior::CircuitBreakerBehavior;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Configuration for a [`CircuitBreaker`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures needed to open the circuit.
    pub failure_threshold: u32,
    /// How long to stay Open before probing recovery (HalfOpen).
    pub timeout: Duration,
    /// Consecutive HalfOpen successes needed to close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// Point-in-time metrics snapshot.
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub current_state: CircuitState,
    pub consecutive_failures: u32,
    pub half_open_calls: u32,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
}

/// A single named circuit breaker, protected by a mutex covering its whole
/// state (status transitions must be single-writer — design note "Status
/// racing" in spec §9 applies equally here).
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether the recovery timeout has elapsed since the circuit opened,
    /// transitioning Open -> HalfOpen as a side effect when it has.
    fn maybe_recover(&self, inner: &mut Inner) {
        if inner.state == CircuitState::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.config.timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_successes = 0;
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_recover(&mut inner);
        inner.state
    }

    pub fn should_allow(&self) -> bool {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_recover(&mut inner);
        !matches!(inner.state, CircuitState::Open)
    }

    pub fn record_success_manual(&self, _duration: Duration) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_recover(&mut inner);
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.success_threshold {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure_manual(&self, _duration: Duration) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_recover(&mut inner);
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    pub fn force_open(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
    }

    pub fn force_closed(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.half_open_successes = 0;
        inner.opened_at = None;
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.maybe_recover(&mut inner);
        CircuitBreakerMetrics {
            current_state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            half_open_calls: inner.half_open_successes,
        }
    }
}

impl CircuitBreakerBehavior for CircuitBreaker {
    fn name(&self) -> &str {
        CircuitBreaker::name(self)
    }

    fn state(&self) -> CircuitState {
        CircuitBreaker::state(self)
    }

    fn should_allow(&self) -> bool {
        CircuitBreaker::should_allow(self)
    }

    fn record_success(&self, duration: Duration) {
        self.record_success_manual(duration)
    }

    fn record_failure(&self, duration: Duration) {
        self.record_failure_manual(duration)
    }

    fn is_healthy(&self) -> bool {
        CircuitBreaker::is_healthy(self)
    }

    fn force_open(&self) {
        CircuitBreaker::force_open(self)
    }

    fn force_closed(&self) {
        CircuitBreaker::force_closed(self)
    }

    fn metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreaker::metrics(self)
    }
}
