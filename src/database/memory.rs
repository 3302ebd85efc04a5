//! In-memory stores with the same paging semantics as the PostgreSQL ones.

use super::{ContactStore, SyncStatusStore};
use crate::error::Result;
use crate::models::{Contact, Email, GroupContact, SyncRecord, SyncStats, SyncTarget};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct ContactData {
    targets: Vec<SyncTarget>,
    memberships: Vec<GroupContact>,
    contacts: HashMap<i64, Contact>,
    emails: Vec<Email>,
}

/// Mutable fixture; writes are visible to subsequent reads, which lets tests
/// change the data between planning and execution.
#[derive(Debug, Default)]
pub struct InMemoryContactStore {
    data: RwLock<ContactData>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&self, target: SyncTarget) {
        self.data.write().targets.push(target);
    }

    pub fn clear_targets(&self) {
        self.data.write().targets.clear();
    }

    pub fn add_contact(&self, contact: Contact) {
        self.data.write().contacts.insert(contact.id, contact);
    }

    pub fn add_email(&self, email: Email) {
        self.data.write().emails.push(email);
    }

    /// Add a membership row; ids are assigned in insertion order
    pub fn add_membership(&self, group_id: i64, contact_id: i64, status: &str) -> i64 {
        let mut data = self.data.write();
        let id = data.memberships.len() as i64 + 1;
        data.memberships.push(GroupContact {
            id,
            group_id,
            contact_id,
            status: status.to_string(),
        });
        id
    }

    fn added_members(data: &ContactData, group_ids: &[i64]) -> Vec<GroupContact> {
        let mut members: Vec<GroupContact> = data
            .memberships
            .iter()
            .filter(|m| m.is_added() && group_ids.contains(&m.group_id))
            .cloned()
            .collect();
        members.sort_by_key(|m| m.id);
        members
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn sync_targets(&self) -> Result<Vec<SyncTarget>> {
        Ok(self
            .data
            .read()
            .targets
            .iter()
            .filter(|t| !t.list_id.is_empty())
            .cloned()
            .collect())
    }

    async fn count_members(&self, group_ids: &[i64]) -> Result<i64> {
        Ok(Self::added_members(&self.data.read(), group_ids).len() as i64)
    }

    async fn fetch_members(
        &self,
        group_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<GroupContact>> {
        Ok(Self::added_members(&self.data.read(), group_ids)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn lookup_contact(&self, contact_id: i64) -> Result<Option<Contact>> {
        Ok(self.data.read().contacts.get(&contact_id).cloned())
    }

    async fn primary_email(&self, contact_id: i64) -> Result<Option<Email>> {
        Ok(self
            .data
            .read()
            .emails
            .iter()
            .filter(|e| e.contact_id == contact_id && e.is_primary)
            .min_by_key(|e| e.id)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySyncStatusStore {
    records: RwLock<Vec<SyncRecord>>,
}

impl InMemorySyncStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStatusStore for InMemorySyncStatusStore {
    async fn reset(&self) -> Result<u64> {
        let mut records = self.records.write();
        let previous = records.len() as u64;
        records.clear();
        Ok(previous)
    }

    async fn create(&self, record: &SyncRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<SyncStats> {
        Ok(SyncStats::from_records(self.records.read().iter()))
    }

    async fn records(&self) -> Result<Vec<SyncRecord>> {
        Ok(self.records.read().clone())
    }
}
