//! Mapping from a dispatched task's `pair_id` to the task itself and the
//! instant it was handed out, so [`SubmitResult`][crate::grpc] can enforce
//! the per-operator deadline and reject a second submission for the same
//! task.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use tasker_shared::types::Task;

struct Entry {
    task: Task,
    dispatched_at: Instant,
}

/// `pair_id -> (Task, dispatch instant)`, mutex-protected. Removal is
/// atomic: at most one caller ever sees a given entry.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<i64, Entry>>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("pair_id", &self.task.pair_id)
            .field("dispatched_at", &self.dispatched_at)
            .finish()
    }
}

impl InFlightRegistry {
    pub fn new() -> Self {
        InFlightRegistry {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record that `task` was just handed to a worker.
    pub fn record_dispatch(&self, task: Task) {
        let pair_id = task.pair_id;
        let entry = Entry {
            task,
            dispatched_at: Instant::now(),
        };
        self.entries
            .lock()
            .expect("in-flight registry mutex poisoned")
            .insert(pair_id, entry);
    }

    /// Remove and return the entry for `pair_id`, along with how long it sat
    /// in flight. `None` if it was never dispatched, already completed, or
    /// already timed out and removed.
    pub fn take(&self, pair_id: i64) -> Option<(Task, std::time::Duration)> {
        let entry = self
            .entries
            .lock()
            .expect("in-flight registry mutex poisoned")
            .remove(&pair_id)?;
        Some((entry.task, entry.dispatched_at.elapsed()))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("in-flight registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
