//! # Resilience
//!
//! A small circuit breaker, grounded in
//! `tasker-shared::resilience::behavior::CircuitBreakerBehavior` and the
//! wrapping pattern in
//! `tasker-orchestration::orchestration::task_readiness::circuit_breaker`.
//! Used by the Persistence Adapter to fail fast on a database that is
//! already down rather than retry-storm it (spec §7 `PersistenceFailure`).

mod behavior;
mod circuit_breaker;

pub use behavior::CircuitBreakerBehavior;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
