//! The set of live expressions: indexed by id and by owner, with a
//! monotonic id cursor and a pick-any-ready lookup used by the dispatch
//! protocol.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tasker_shared::config::OrchestratorConfig;
use tasker_shared::types::{Expression, ExpressionStatus, PostfixToken, ShortExpression};

use crate::task_factory::build_tasks;
use crate::task_graph::TaskGraph;

struct ExpressionState {
    status: ExpressionStatus,
    result: Option<i64>,
}

/// A live expression: its identity and postfix are immutable after
/// creation; its status/result and task graph are each independently
/// mutex-protected so a FetchTask on one expression never contends with a
/// SubmitResult on another.
#[derive(Debug)]
pub struct ExpressionHandle {
    pub id: i64,
    pub owner_id: i64,
    pub postfix: Vec<PostfixToken>,
    pub task_graph: TaskGraph,
    state: Mutex<ExpressionState>,
}

impl std::fmt::Debug for ExpressionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionState")
            .field("status", &self.status)
            .field("result", &self.result)
            .finish()
    }
}

impl ExpressionHandle {
    pub fn status(&self) -> ExpressionStatus {
        self.state.lock().expect("expression state mutex poisoned").status
    }

    pub fn result(&self) -> Option<i64> {
        self.state.lock().expect("expression state mutex poisoned").result
    }

    /// Only a live (non-terminal) status may change after creation; once
    /// Completed or Cancelled it never changes again.
    pub fn set_status(&self, status: ExpressionStatus) {
        let mut state = self.state.lock().expect("expression state mutex poisoned");
        if matches!(state.status, ExpressionStatus::Completed | ExpressionStatus::Cancelled) {
            return;
        }
        state.status = status;
    }

    pub fn mark_completed(&self, result: i64) {
        let mut state = self.state.lock().expect("expression state mutex poisoned");
        if matches!(state.status, ExpressionStatus::Completed | ExpressionStatus::Cancelled) {
            return;
        }
        state.status = ExpressionStatus::Completed;
        state.result = Some(result);
    }

    pub fn mark_cancelled(&self) {
        let mut state = self.state.lock().expect("expression state mutex poisoned");
        if matches!(state.status, ExpressionStatus::Completed | ExpressionStatus::Cancelled) {
            return;
        }
        state.status = ExpressionStatus::Cancelled;
    }

    pub fn to_short(&self) -> ShortExpression {
        let state = self.state.lock().expect("expression state mutex poisoned");
        ShortExpression {
            id: self.id,
            owner_id: self.owner_id,
            status: state.status,
            result: state.result,
        }
    }

    pub fn to_expression(&self) -> Expression {
        let state = self.state.lock().expect("expression state mutex poisoned");
        Expression {
            id: self.id,
            owner_id: self.owner_id,
            postfix: self.postfix.clone(),
            status: state.status,
            result: state.result,
        }
    }
}

struct Inner {
    by_id: HashMap<i64, Arc<ExpressionHandle>>,
    by_owner: HashMap<i64, Vec<i64>>,
    next_id: i64,
}

/// `id -> Expression`, `owner_id -> [Expression]`, and the id cursor used to
/// keep identifiers globally unique across process restarts.
#[derive(Debug)]
pub struct ExpressionRegistry {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("live_count", &self.by_id.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl ExpressionRegistry {
    /// `start_id` should be `get_max_id() + 1` from the persistence adapter
    /// on a fresh process, so ids never collide with already-stored rows.
    pub fn new(start_id: i64) -> Self {
        ExpressionRegistry {
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
                by_owner: HashMap::new(),
                next_id: start_id,
            }),
        }
    }

    /// Reserve the next id, build the task buffer, and insert the new
    /// expression into both maps.
    pub fn create(
        &self,
        owner_id: i64,
        postfix: Vec<PostfixToken>,
        config: &OrchestratorConfig,
    ) -> Arc<ExpressionHandle> {
        let mut inner = self.inner.lock().expect("expression registry mutex poisoned");
        let id = inner.next_id;
        inner.next_id += 1;

        let tasks = build_tasks(id, &postfix, config);
        // An empty postfix (spec §8 scenario 5) has no root task to ever
        // complete it, so it starts NoReady rather than HasReady: pick_ready
        // must never select it, or take_next_ready would be asked to
        // manufacture a Ready task from an empty buffer (a BugInvariantViolation).
        let initial_status = if tasks.is_empty() {
            ExpressionStatus::NoReady
        } else {
            ExpressionStatus::HasReady
        };
        let handle = Arc::new(ExpressionHandle {
            id,
            owner_id,
            postfix,
            task_graph: TaskGraph::new(tasks),
            state: Mutex::new(ExpressionState {
                status: initial_status,
                result: None,
            }),
        });

        inner.by_id.insert(id, Arc::clone(&handle));
        inner.by_owner.entry(owner_id).or_default().push(id);
        handle
    }

    pub fn get(&self, id: i64) -> Option<Arc<ExpressionHandle>> {
        self.inner
            .lock()
            .expect("expression registry mutex poisoned")
            .by_id
            .get(&id)
            .cloned()
    }

    pub fn get_owned(&self, owner_id: i64, id: i64) -> Option<Arc<ExpressionHandle>> {
        self.get(id).filter(|expr| expr.owner_id == owner_id)
    }

    pub fn list_owned(&self, owner_id: i64) -> Vec<Arc<ExpressionHandle>> {
        let inner = self.inner.lock().expect("expression registry mutex poisoned");
        inner
            .by_owner
            .get(&owner_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    /// Any live expression currently in status HasReady. First-found;
    /// fairness across expressions is not promised.
    pub fn pick_ready(&self) -> Option<Arc<ExpressionHandle>> {
        let inner = self.inner.lock().expect("expression registry mutex poisoned");
        inner
            .by_id
            .values()
            .find(|expr| expr.status() == ExpressionStatus::HasReady)
            .cloned()
    }

    pub fn remove(&self, id: i64) {
        let mut inner = self.inner.lock().expect("expression registry mutex poisoned");
        if let Some(expr) = inner.by_id.remove(&id) {
            if let Some(owned) = inner.by_owner.get_mut(&expr.owner_id) {
                owned.retain(|&owned_id| owned_id != id);
            }
        }
    }

    /// A short view of every live expression, regardless of owner. Used by
    /// listing endpoints that aggregate across users rather than scoping to
    /// one owner.
    pub fn list_all_short(&self) -> Vec<ShortExpression> {
        let inner = self.inner.lock().expect("expression registry mutex poisoned");
        inner.by_id.values().map(|expr| expr.to_short()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("expression registry mutex poisoned").by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::translate;

    fn registry() -> ExpressionRegistry {
        ExpressionRegistry::new(1)
    }

    #[test]
    fn create_assigns_sequential_ids_from_the_cursor() {
        let registry = ExpressionRegistry::new(100);
        let config = OrchestratorConfig::default();
        let a = registry.create(1, translate("2+3").unwrap(), &config);
        let b = registry.create(1, translate("4+5").unwrap(), &config);
        assert_eq!(a.id, 100);
        assert_eq!(b.id, 101);
    }

    #[test]
    fn new_expression_starts_has_ready() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        let expr = registry.create(1, translate("2+3").unwrap(), &config);
        assert_eq!(expr.status(), ExpressionStatus::HasReady);
    }

    #[test]
    fn get_owned_rejects_wrong_owner() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        let expr = registry.create(1, translate("2+3").unwrap(), &config);
        assert!(registry.get_owned(1, expr.id).is_some());
        assert!(registry.get_owned(2, expr.id).is_none());
    }

    #[test]
    fn pick_ready_ignores_expressions_without_ready_tasks() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        let expr = registry.create(1, translate("2+3").unwrap(), &config);
        expr.set_status(ExpressionStatus::NoReady);
        assert!(registry.pick_ready().is_none());
        expr.set_status(ExpressionStatus::HasReady);
        assert!(registry.pick_ready().is_some());
    }

    #[test]
    fn completed_status_is_monotone() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        let expr = registry.create(1, translate("2+3").unwrap(), &config);
        expr.mark_completed(5);
        expr.set_status(ExpressionStatus::HasReady);
        assert_eq!(expr.status(), ExpressionStatus::Completed);
    }

    #[test]
    fn remove_drops_from_both_maps() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        let expr = registry.create(7, translate("2+3").unwrap(), &config);
        registry.remove(expr.id);
        assert!(registry.get(expr.id).is_none());
        assert!(registry.list_owned(7).is_empty());
    }

    #[test]
    fn list_all_short_reflects_every_live_expression() {
        let registry = registry();
        let config = OrchestratorConfig::default();
        registry.create(1, translate("2+3").unwrap(), &config);
        registry.create(2, translate("4+5").unwrap(), &config);
        assert_eq!(registry.list_all_short().len(), 2);
    }
}
