//! # Database Operations
//!
//! Read access to the CRM's groups, contacts and emails, and the write path for
//! the sync status table.
//!
//! Both are expressed as traits so the executor can run against PostgreSQL
//! ([`PgContactStore`], [`PgSyncStatusStore`]) or against in-memory fixtures
//! ([`InMemoryContactStore`], [`InMemorySyncStatusStore`]).

pub mod connection;
pub mod contact_store;
pub mod memory;
pub mod status_store;

use crate::error::Result;
use crate::models::{Contact, Email, GroupContact, SyncRecord, SyncStats, SyncTarget};
use async_trait::async_trait;

pub use connection::DatabaseConnection;
pub use contact_store::PgContactStore;
pub use memory::{InMemoryContactStore, InMemorySyncStatusStore};
pub use status_store::PgSyncStatusStore;

/// Read-only view of group memberships, contacts and emails
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Groups that have a Mailchimp list configured
    async fn sync_targets(&self) -> Result<Vec<SyncTarget>>;

    /// Number of "Added" memberships across `group_ids`
    async fn count_members(&self, group_ids: &[i64]) -> Result<i64>;

    /// "Added" memberships across `group_ids`, ordered by membership id,
    /// sliced to `[offset, offset + limit)`
    async fn fetch_members(
        &self,
        group_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<GroupContact>>;

    async fn lookup_contact(&self, contact_id: i64) -> Result<Option<Contact>>;

    async fn primary_email(&self, contact_id: i64) -> Result<Option<Email>>;

    /// Total number of memberships a full run has to page through
    async fn member_count_for_groups_to_sync(&self) -> Result<i64> {
        let group_ids: Vec<i64> = self
            .sync_targets()
            .await?
            .iter()
            .map(|target| target.group_id)
            .collect();

        if group_ids.is_empty() {
            return Ok(0);
        }
        self.count_members(&group_ids).await
    }
}

/// The per-run status table
#[async_trait]
pub trait SyncStatusStore: Send + Sync {
    /// Truncate the table; returns the number of discarded records
    async fn reset(&self) -> Result<u64>;

    async fn create(&self, record: &SyncRecord) -> Result<()>;

    async fn stats(&self) -> Result<SyncStats>;

    async fn records(&self) -> Result<Vec<SyncRecord>>;
}
