//! Durable storage for completed expressions: append-on-completion, no
//! partial writes, and the startup query that seeds the id cursor.

mod memory;
mod postgres;

pub use memory::InMemoryPersistence;
pub use postgres::PostgresPersistence;

use async_trait::async_trait;
use tasker_shared::types::ShortExpression;
use tasker_shared::TaskerResult;

/// Storage boundary for finished expressions. Implementations must be safe
/// to call from multiple callers concurrently; there is no serialization
/// requirement beyond what the backing store already gives "insert" and
/// "select" operations.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Snapshot a terminal (Completed or Cancelled) expression. Called
    /// exactly once per expression, after its Task Graph reaches a root
    /// completion or a deadline-triggered cancellation.
    async fn insert_completed_expression(&self, expr: &ShortExpression) -> TaskerResult<()>;

    /// The highest expression id already stored, or `0` if the store is
    /// empty. Used to seed the Expression Registry's id cursor so ids never
    /// collide with identifiers issued before a restart.
    async fn get_max_id(&self) -> TaskerResult<i64>;

    /// Every expression belonging to `owner_id`, order unspecified.
    async fn list_by_owner(&self, owner_id: i64) -> TaskerResult<Vec<ShortExpression>>;

    /// A single expression belonging to `owner_id`, or `None` if it doesn't
    /// exist or belongs to someone else.
    async fn get_by_owner(&self, owner_id: i64, id: i64) -> TaskerResult<Option<ShortExpression>>;
}
