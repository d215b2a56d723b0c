//! Per-expression scheduler: an ordered Task buffer plus two cursors
//! (`scanned`, `updated`) that together resolve Waiting tasks into Ready
//! tasks as their predecessors complete, without ever blocking on anything
//! but its own short critical section.

use std::sync::Mutex;

use tasker_shared::types::{Operand, Task, TaskStatus};
use tasker_shared::{TaskerError, TaskerResult};

struct Inner {
    buf: Vec<Task>,
    scanned: usize,
    updated: usize,
}

/// Outcome of [`TaskGraph::take_next_ready`]: the dispatched task, and
/// whether it is the root (the buffer has shrunk to just that one task, so
/// the caller should mark the owning Expression `NoReady`).
#[derive(Debug, Clone)]
pub struct TakeOutcome {
    pub task: Task,
    pub is_root: bool,
}

/// Outcome of [`TaskGraph::record_completion`].
#[derive(Debug, Clone, Copy)]
pub enum CompletionOutcome {
    /// The expression still has work outstanding.
    Continuing,
    /// The root task just completed; the expression's final value is this.
    ExpressionCompleted { result: i64 },
}

/// The scheduler owned by one live Expression.
#[derive(Debug)]
pub struct TaskGraph {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("len", &self.buf.len())
            .field("scanned", &self.scanned)
            .field("updated", &self.updated)
            .finish()
    }
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskGraph {
            inner: Mutex::new(Inner {
                buf: tasks,
                scanned: 0,
                updated: 0,
            }),
        }
    }

    /// Number of tasks still live in the buffer.
    pub fn remaining(&self) -> usize {
        self.inner.lock().expect("task graph mutex poisoned").buf.len()
    }

    /// Fetch the next dispatchable task, rewriting a Waiting task into a
    /// Ready one via back-fill if its predecessors have already completed.
    pub fn take_next_ready(&self) -> TaskerResult<TakeOutcome> {
        let mut inner = self.inner.lock().expect("task graph mutex poisoned");

        let idx = inner.scanned;
        if idx >= inner.buf.len() {
            return Err(TaskerError::BugInvariantViolation(format!(
                "take_next_ready called with scanned={idx} past buffer end ({})",
                inner.buf.len()
            )));
        }

        match inner.buf[idx].status {
            TaskStatus::ReadyToCompute => {
                inner.buf[idx].status = TaskStatus::Dispatched;
                inner.scanned += 1;
                let task = inner.buf[idx].clone();
                let is_root = inner.buf.len() == 1;
                Ok(TakeOutcome { task, is_root })
            }
            TaskStatus::WaitingOnPredecessors => {
                if inner.updated != inner.scanned {
                    return Err(TaskerError::BugInvariantViolation(format!(
                        "take_next_ready invoked on a Waiting task before its predecessors updated (updated={}, scanned={})",
                        inner.updated, inner.scanned
                    )));
                }
                back_fill(&mut inner)?;

                let idx = inner.scanned;
                inner.buf[idx].status = TaskStatus::Dispatched;
                inner.scanned += 1;
                let task = inner.buf[idx].clone();
                let is_root = inner.buf.len() == 1;
                Ok(TakeOutcome { task, is_root })
            }
            other => Err(TaskerError::BugInvariantViolation(format!(
                "take_next_ready found task at scanned={idx} in status {other:?}"
            ))),
        }
    }

    /// Write a worker's result into the task identified by `pair_id`,
    /// transitioning it to Computed. Returns `ExpressionCompleted` when this
    /// was the root (the only task left in the buffer).
    pub fn record_completion(&self, pair_id: i64, value: i64) -> TaskerResult<CompletionOutcome> {
        let mut inner = self.inner.lock().expect("task graph mutex poisoned");

        let pos = inner
            .buf
            .iter()
            .position(|t| t.pair_id == pair_id)
            .ok_or_else(|| TaskerError::UnknownTaskId(pair_id))?;

        match inner.buf[pos].status {
            TaskStatus::Computed => return Err(TaskerError::DoubleWrite(pair_id)),
            TaskStatus::Dispatched => {}
            other => {
                return Err(TaskerError::BugInvariantViolation(format!(
                    "record_completion({pair_id}) found task in status {other:?}, expected Dispatched"
                )))
            }
        }

        inner.buf[pos].result = Some(value);
        inner.buf[pos].status = TaskStatus::Computed;
        inner.updated += 1;

        if inner.buf.len() == 1 {
            Ok(CompletionOutcome::ExpressionCompleted { result: value })
        } else {
            Ok(CompletionOutcome::Continuing)
        }
    }
}

/// Rewrite the Waiting task at `inner.scanned` by back-filling its
/// unresolved arguments from already-Computed predecessors, following the
/// branch selected by the current `scanned` cursor. With one or two
/// operators ahead of the root the predecessors sit at the front of the
/// buffer; with three or more they sit immediately before this task. The
/// two regimes are not interchangeable — collapsing them mis-threads inputs
/// like `32+(4*2)/4` on deeper graphs.
fn back_fill(inner: &mut Inner) -> TaskerResult<()> {
    match inner.scanned {
        0 => Err(TaskerError::BugInvariantViolation(
            "back_fill invoked at scanned == 0; the first task is always Ready by construction"
                .to_string(),
        )),
        1 => {
            let value = computed_result(inner, 0)?;
            inner.buf.remove(0);
            let target = &mut inner.buf[0];
            fill_if_unresolved(&mut target.arg1, value);
            inner.scanned = 0;
            inner.updated = 0;
            Ok(())
        }
        2 => {
            let idx = inner.scanned;
            let first = computed_result(inner, 0)?;
            inner.buf.remove(0);
            {
                let target = &mut inner.buf[idx - 1];
                fill_if_unresolved(&mut target.arg1, first);
            }
            let second = computed_result(inner, 0)?;
            inner.buf.remove(0);
            {
                let target = &mut inner.buf[idx - 2];
                fill_if_unresolved(&mut target.arg2, second);
            }
            inner.scanned = 0;
            inner.updated = 0;
            Ok(())
        }
        scanned => {
            let near = computed_result(inner, scanned - 1)?;
            inner.buf.remove(scanned - 1);
            {
                let target = &mut inner.buf[scanned - 1];
                fill_if_unresolved(&mut target.arg2, near);
            }
            let far = computed_result(inner, scanned - 2)?;
            inner.buf.remove(scanned - 2);
            {
                let target = &mut inner.buf[scanned - 2];
                fill_if_unresolved(&mut target.arg1, far);
            }
            inner.scanned = scanned - 1;
            inner.updated = inner.updated.saturating_sub(2);
            Ok(())
        }
    }
}

fn computed_result(inner: &Inner, idx: usize) -> TaskerResult<i64> {
    let task = inner.buf.get(idx).ok_or_else(|| {
        TaskerError::BugInvariantViolation(format!(
            "back_fill predecessor at index {idx} missing from a buffer of length {}",
            inner.buf.len()
        ))
    })?;
    task.result.ok_or_else(|| {
        TaskerError::BugInvariantViolation(format!(
            "back_fill predecessor at index {idx} is not yet Computed"
        ))
    })
}

fn fill_if_unresolved(slot: &mut Operand, value: i64) {
    if matches!(slot, Operand::Unresolved) {
        *slot = Operand::Known(value);
    }
}
