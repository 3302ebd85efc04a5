use super::ContactStore;
use crate::constants::GROUP_CONTACT_ADDED;
use crate::error::Result;
use crate::models::{Contact, Email, GroupContact, SyncTarget};
use async_trait::async_trait;
use sqlx::PgPool;

/// Contact store over the CRM tables in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn sync_targets(&self) -> Result<Vec<SyncTarget>> {
        let targets = sqlx::query_as::<_, SyncTarget>(
            r#"
            SELECT group_id, list_id, grouping
            FROM civicrm_mailchimp_group_settings
            WHERE list_id IS NOT NULL AND list_id <> ''
            ORDER BY group_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(targets)
    }

    async fn count_members(&self, group_ids: &[i64]) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM civicrm_group_contact
            WHERE group_id = ANY($1) AND status = $2
            "#,
        )
        .bind(group_ids)
        .bind(GROUP_CONTACT_ADDED)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn fetch_members(
        &self,
        group_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<GroupContact>> {
        let members = sqlx::query_as::<_, GroupContact>(
            r#"
            SELECT id, group_id, contact_id, status
            FROM civicrm_group_contact
            WHERE group_id = ANY($1) AND status = $2
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(group_ids)
        .bind(GROUP_CONTACT_ADDED)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn lookup_contact(&self, contact_id: i64) -> Result<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, first_name, last_name, is_opt_out, do_not_email
            FROM civicrm_contact
            WHERE id = $1
            "#,
        )
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn primary_email(&self, contact_id: i64) -> Result<Option<Email>> {
        let email = sqlx::query_as::<_, Email>(
            r#"
            SELECT id, contact_id, email, is_primary, on_hold
            FROM civicrm_email
            WHERE contact_id = $1 AND is_primary
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(email)
    }
}
