//! # Error Taxonomy
//!
//! Unified error handling across the orchestrator, client, and worker
//! (spec §7). The RPC layer is the only place status codes are minted —
//! everything below this module stays a plain `Result<_, TaskerError>`.

use thiserror::Error;

/// Result alias used throughout the orchestration core.
pub type TaskerResult<T> = Result<T, TaskerError>;

/// Comprehensive error taxonomy for the orchestrator core (spec §7).
#[derive(Debug, Error)]
pub enum TaskerError {
    /// Client input defect: the infix string could not be tokenized into a
    /// valid postfix sequence (unbalanced operators, stray tokens after `)`).
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Client input defect: parentheses did not balance.
    #[error("mismatched parentheses")]
    MismatchedParentheses,

    /// `SubmitResult` referenced a `pair_id` with no in-flight entry.
    #[error("unknown task id: {0}")]
    UnknownTaskId(i64),

    /// A dispatched task's result arrived after its configured deadline.
    #[error("deadline exceeded for task {pair_id}: took {elapsed:?}, allowed {deadline:?}")]
    DeadlineExceeded {
        pair_id: i64,
        elapsed: std::time::Duration,
        deadline: std::time::Duration,
    },

    /// An internal scheduler invariant was violated; logged, never panics.
    #[error("bug invariant violation: {0}")]
    BugInvariantViolation(String),

    /// A second `SubmitResult` arrived for an already-Computed task.
    #[error("task already computed: {0}")]
    DoubleWrite(i64),

    /// The expression or owner referenced does not exist (or isn't owned).
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistence adapter failed to snapshot a completed expression.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

impl TaskerError {
    /// Whether retrying the same operation might succeed (used by clients
    /// deciding whether to back off and retry vs. surface the error).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TaskerError::PersistenceFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_failure_is_recoverable() {
        let err = TaskerError::PersistenceFailure("connection reset".to_string());
        assert!(err.is_recoverable());
    }

    #[test]
    fn invalid_expression_is_not_recoverable() {
        let err = TaskerError::InvalidExpression("2++2".to_string());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn double_write_is_not_recoverable() {
        assert!(!TaskerError::DoubleWrite(7).is_recoverable());
    }

    #[test]
    fn display_unknown_task_id() {
        let err = TaskerError::UnknownTaskId(42);
        assert_eq!(format!("{err}"), "unknown task id: 42");
    }

    #[test]
    fn display_deadline_exceeded() {
        let err = TaskerError::DeadlineExceeded {
            pair_id: 3,
            elapsed: std::time::Duration::from_secs(5),
            deadline: std::time::Duration::from_secs(2),
        };
        assert!(format!("{err}").contains("deadline exceeded for task 3"));
    }
}
