use std::sync::Mutex;

use async_trait::async_trait;
use tasker_shared::types::ShortExpression;
use tasker_shared::TaskerResult;

use super::Persistence;

/// In-process store used by tests and by the in-memory bootstrap path; never
/// durable across restarts.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    rows: Mutex<Vec<ShortExpression>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn insert_completed_expression(&self, expr: &ShortExpression) -> TaskerResult<()> {
        self.rows
            .lock()
            .expect("in-memory persistence mutex poisoned")
            .push(expr.clone());
        Ok(())
    }

    async fn get_max_id(&self) -> TaskerResult<i64> {
        let rows = self.rows.lock().expect("in-memory persistence mutex poisoned");
        Ok(rows.iter().map(|row| row.id).max().unwrap_or(0))
    }

    async fn list_by_owner(&self, owner_id: i64) -> TaskerResult<Vec<ShortExpression>> {
        let rows = self.rows.lock().expect("in-memory persistence mutex poisoned");
        Ok(rows.iter().filter(|row| row.owner_id == owner_id).cloned().collect())
    }

    async fn get_by_owner(&self, owner_id: i64, id: i64) -> TaskerResult<Option<ShortExpression>> {
        let rows = self.rows.lock().expect("in-memory persistence mutex poisoned");
        Ok(rows
            .iter()
            .find(|row| row.owner_id == owner_id && row.id == id)
            .cloned())
    }
}
