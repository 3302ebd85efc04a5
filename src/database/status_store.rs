use super::SyncStatusStore;
use crate::error::Result;
use crate::models::{SyncRecord, SyncStats};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

/// Status table `civicrm_mailchimp_sync` in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgSyncStatusStore {
    pool: PgPool,
}

impl PgSyncStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStatusStore for PgSyncStatusStore {
    async fn reset(&self) -> Result<u64> {
        let previous: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM civicrm_mailchimp_sync")
            .fetch_one(&self.pool)
            .await?;

        sqlx::query("TRUNCATE TABLE civicrm_mailchimp_sync")
            .execute(&self.pool)
            .await?;

        Ok(previous.max(0) as u64)
    }

    async fn create(&self, record: &SyncRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO civicrm_mailchimp_sync
                (email_id, mc_list_id, mc_euid, mc_leid, sync_status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.email_id)
        .bind(&record.list_id)
        .bind(&record.remote_user_id)
        .bind(&record.remote_list_entry_id)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> Result<SyncStats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT sync_status, COUNT(*)
            FROM civicrm_mailchimp_sync
            GROUP BY sync_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = SyncStats::default();
        for (status, count) in rows {
            match status.parse() {
                Ok(status) => stats.record(status, count),
                Err(e) => warn!(error = %e, count, "Ignoring unknown sync status"),
            }
        }
        Ok(stats)
    }

    async fn records(&self) -> Result<Vec<SyncRecord>> {
        let records = sqlx::query_as::<_, SyncRecord>(
            r#"
            SELECT
                email_id,
                mc_list_id AS list_id,
                mc_euid AS remote_user_id,
                mc_leid AS remote_list_entry_id,
                sync_status AS status
            FROM civicrm_mailchimp_sync
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
