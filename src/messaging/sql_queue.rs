//! # SQL-backed Work Queue
//!
//! Persists batch tasks in `civicrm_mailchimp_queue_item` so a run survives
//! process restarts and can be resumed step by step.

use super::work_queue::{QueueItem, WorkQueue};
use crate::error::{Result, SyncError};
use crate::logging::log_queue_operation;
use crate::models::BatchTask;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, warn};

#[derive(Debug, FromRow)]
struct QueueRow {
    id: i64,
    payload: Json<BatchTask>,
}

impl From<QueueRow> for QueueItem {
    fn from(row: QueueRow) -> Self {
        Self {
            id: row.id,
            task: row.payload.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgWorkQueue {
    pool: PgPool,
    name: String,
}

impl PgWorkQueue {
    pub fn new(pool: PgPool, name: impl Into<String>) -> Self {
        Self {
            pool,
            name: name.into(),
        }
    }

    fn error(&self, operation: &str, err: sqlx::Error) -> SyncError {
        SyncError::queue_operation(&self.name, operation, err.to_string())
    }
}

#[async_trait]
impl WorkQueue for PgWorkQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reset(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM civicrm_mailchimp_queue_item WHERE queue_name = $1")
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .map_err(|e| self.error("reset", e))?;

        if result.rows_affected() > 0 {
            warn!(
                queue_name = %self.name,
                removed = result.rows_affected(),
                "Discarded items left over from a previous run"
            );
        }
        log_queue_operation("reset", &self.name, None, "ok");
        Ok(result.rows_affected())
    }

    async fn enqueue(&self, task: &BatchTask) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO civicrm_mailchimp_queue_item (queue_name, payload)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&self.name)
        .bind(Json(task))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.error("enqueue", e))?;

        debug!(queue_name = %self.name, item_id = id, label = %task.label, "Task enqueued");
        Ok(id)
    }

    async fn dequeue_next(&self) -> Result<Option<QueueItem>> {
        let row: Option<QueueRow> = sqlx::query_as(
            r#"
            UPDATE civicrm_mailchimp_queue_item
            SET claimed_at = NOW()
            WHERE id = (
                SELECT id FROM civicrm_mailchimp_queue_item
                WHERE queue_name = $1 AND claimed_at IS NULL
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, payload
            "#,
        )
        .bind(&self.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| self.error("dequeue_next", e))?;

        if let Some(row) = &row {
            log_queue_operation("claim", &self.name, Some(row.id), "ok");
        }
        Ok(row.map(QueueItem::from))
    }

    async fn complete(&self, item: &QueueItem) -> Result<()> {
        sqlx::query("DELETE FROM civicrm_mailchimp_queue_item WHERE id = $1")
            .bind(item.id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.error("complete", e))?;
        Ok(())
    }

    async fn release(&self, item: &QueueItem) -> Result<()> {
        sqlx::query("UPDATE civicrm_mailchimp_queue_item SET claimed_at = NULL WHERE id = $1")
            .bind(item.id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.error("release", e))?;

        log_queue_operation("release", &self.name, Some(item.id), "ok");
        Ok(())
    }

    async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM civicrm_mailchimp_queue_item WHERE queue_name = $1",
        )
        .bind(&self.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| self.error("len", e))?;

        Ok(count.max(0) as u64)
    }
}
