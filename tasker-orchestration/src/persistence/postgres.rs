use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::PgPool;
use tasker_shared::resilience::{CircuitBreaker, CircuitBreakerBehavior, CircuitBreakerConfig};
use tasker_shared::types::{ExpressionStatus, ShortExpression};
use tasker_shared::{TaskerError, TaskerResult};
use tracing::{debug, warn};

use super::Persistence;

/// Minimal schema this adapter reads and writes (spec §6 "Persistent schema
/// (abstract)"). No migration tooling sits in front of this — it is
/// executed directly by the adapter's own tests against a real database.
#[cfg(test)]
const CREATE_EXPRESSIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS expressions (
    id BIGINT PRIMARY KEY,
    owner_id BIGINT NOT NULL,
    status TEXT NOT NULL,
    result BIGINT
)";

/// sqlx-backed adapter over the `expressions` table. Schema is out of this
/// crate's scope beyond the columns this adapter reads and writes:
/// `(id primary key, owner_id, status text, result bigint)`. Writes go
/// through a circuit breaker so a struggling database fails fast instead of
/// piling up dispatch-protocol callers behind a string of slow timeouts.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
    write_breaker: Arc<CircuitBreaker>,
}

impl PostgresPersistence {
    pub async fn connect(database_url: &str) -> TaskerResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| TaskerError::PersistenceFailure(format!("connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PostgresPersistence {
            pool,
            write_breaker: Arc::new(CircuitBreaker::new(
                "postgres-expression-writes".to_string(),
                CircuitBreakerConfig::default(),
            )),
        }
    }
}

fn status_to_text(status: ExpressionStatus) -> &'static str {
    match status {
        ExpressionStatus::HasReady => "has_ready",
        ExpressionStatus::NoReady => "no_ready",
        ExpressionStatus::Completed => "completed",
        ExpressionStatus::Cancelled => "cancelled",
    }
}

fn status_from_text(text: &str) -> TaskerResult<ExpressionStatus> {
    match text {
        "has_ready" => Ok(ExpressionStatus::HasReady),
        "no_ready" => Ok(ExpressionStatus::NoReady),
        "completed" => Ok(ExpressionStatus::Completed),
        "cancelled" => Ok(ExpressionStatus::Cancelled),
        other => Err(TaskerError::PersistenceFailure(format!(
            "unrecognized expression status in storage: {other}"
        ))),
    }
}

#[async_trait]
impl Persistence for PostgresPersistence {
    async fn insert_completed_expression(&self, expr: &ShortExpression) -> TaskerResult<()> {
        if !self.write_breaker.should_allow() {
            return Err(TaskerError::PersistenceFailure(format!(
                "circuit breaker {} open, refusing write for expression {}",
                self.write_breaker.name(),
                expr.id
            )));
        }

        let status = status_to_text(expr.status);
        let started = Instant::now();
        let result = sqlx::query(
            "INSERT INTO expressions (id, owner_id, status, result) VALUES ($1, $2, $3, $4)",
        )
        .bind(expr.id)
        .bind(expr.owner_id)
        .bind(status)
        .bind(expr.result)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                self.write_breaker.record_success(started.elapsed());
                debug!(expression_id = expr.id, status, "persisted completed expression");
                Ok(())
            }
            Err(e) => {
                self.write_breaker.record_failure(started.elapsed());
                warn!(expression_id = expr.id, error = %e, "failed to persist completed expression");
                Err(TaskerError::PersistenceFailure(format!(
                    "insert_completed_expression: {e}"
                )))
            }
        }
    }

    async fn get_max_id(&self) -> TaskerResult<i64> {
        let row: (Option<i64>,) = sqlx::query_as("SELECT max(id) FROM expressions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TaskerError::PersistenceFailure(format!("get_max_id: {e}")))?;
        Ok(row.0.unwrap_or(0))
    }

    async fn list_by_owner(&self, owner_id: i64) -> TaskerResult<Vec<ShortExpression>> {
        let rows: Vec<(i64, i64, String, Option<i64>)> = sqlx::query_as(
            "SELECT id, owner_id, status, result FROM expressions WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TaskerError::PersistenceFailure(format!("list_by_owner: {e}")))?;

        rows.into_iter()
            .map(|(id, owner_id, status, result)| {
                Ok(ShortExpression {
                    id,
                    owner_id,
                    status: status_from_text(&status)?,
                    result,
                })
            })
            .collect()
    }

    async fn get_by_owner(&self, owner_id: i64, id: i64) -> TaskerResult<Option<ShortExpression>> {
        let row: Option<(i64, i64, String, Option<i64>)> = sqlx::query_as(
            "SELECT id, owner_id, status, result FROM expressions WHERE owner_id = $1 AND id = $2",
        )
        .bind(owner_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TaskerError::PersistenceFailure(format!("get_by_owner: {e}")))?;

        row.map(|(id, owner_id, status, result)| {
            Ok(ShortExpression {
                id,
                owner_id,
                status: status_from_text(&status)?,
                result,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_round_trips() {
        for status in [
            ExpressionStatus::HasReady,
            ExpressionStatus::NoReady,
            ExpressionStatus::Completed,
            ExpressionStatus::Cancelled,
        ] {
            assert_eq!(status_from_text(status_to_text(status)).unwrap(), status);
        }
    }

    #[test]
    fn unrecognized_status_text_is_rejected() {
        assert!(status_from_text("bogus").is_err());
    }

    /// Exercises the adapter itself (not just its pure text<->enum helpers)
    /// against a real Postgres, creating the minimal `expressions` table
    /// inline rather than through migration tooling (spec.md §9 Non-goals:
    /// "no SQL schema migration tooling beyond a minimal CREATE TABLE used
    /// by the in-process Postgres adapter's own tests"). Connects via
    /// `TASKER_TEST_DATABASE_URL`, falling back to a conventional local
    /// dev database the way the pack's other Postgres-backed repositories
    /// do; it is expected to run wherever such a database is reachable
    /// (CI or a local Postgres), same as every other `sqlx`-backed test
    /// in this workspace.
    #[tokio::test]
    async fn adapter_round_trips_against_a_real_database() {
        let database_url = std::env::var("TASKER_TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/tasker_test".to_string());

        let pool = PgPool::connect(&database_url)
            .await
            .expect("failed to connect to TASKER_TEST_DATABASE_URL");
        sqlx::query(CREATE_EXPRESSIONS_TABLE)
            .execute(&pool)
            .await
            .expect("failed to create expressions table");
        sqlx::query("DELETE FROM expressions")
            .execute(&pool)
            .await
            .expect("failed to clear expressions table");

        let adapter = PostgresPersistence::from_pool(pool);

        assert_eq!(adapter.get_max_id().await.unwrap(), 0);

        let completed = ShortExpression {
            id: 101,
            owner_id: 7,
            status: ExpressionStatus::Completed,
            result: Some(46),
        };
        let cancelled = ShortExpression {
            id: 102,
            owner_id: 7,
            status: ExpressionStatus::Cancelled,
            result: None,
        };
        adapter.insert_completed_expression(&completed).await.unwrap();
        adapter.insert_completed_expression(&cancelled).await.unwrap();

        assert_eq!(adapter.get_max_id().await.unwrap(), 102);

        let fetched = adapter
            .get_by_owner(7, 101)
            .await
            .unwrap()
            .expect("row 101 should exist");
        assert_eq!(fetched, completed);
        assert!(adapter.get_by_owner(7, 999).await.unwrap().is_none());

        let owned = adapter.list_by_owner(7).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.contains(&completed));
        assert!(owned.contains(&cancelled));
    }
}
