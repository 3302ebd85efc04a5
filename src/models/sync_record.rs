use crate::constants::SyncStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of pushing one email to one remote list during the current run
/// Maps to `civicrm_mailchimp_sync` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncRecord {
    pub email_id: i64,
    pub list_id: String,
    pub remote_user_id: Option<String>,
    pub remote_list_entry_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SyncStatus,
}

impl SyncRecord {
    pub fn new(email_id: i64, list_id: impl Into<String>, status: SyncStatus) -> Self {
        Self {
            email_id,
            list_id: list_id.into(),
            remote_user_id: None,
            remote_list_entry_id: None,
            status,
        }
    }

    pub fn with_remote_ids(
        mut self,
        remote_user_id: Option<String>,
        remote_list_entry_id: Option<String>,
    ) -> Self {
        self.remote_user_id = remote_user_id;
        self.remote_list_entry_id = remote_list_entry_id;
        self
    }
}

impl TryFrom<String> for SyncStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// Aggregate counts shown once a run has finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub added: i64,
    pub updated: i64,
    pub errors: i64,
}

impl SyncStats {
    pub fn total(&self) -> i64 {
        self.added + self.updated + self.errors
    }

    pub fn record(&mut self, status: SyncStatus, count: i64) {
        match status {
            SyncStatus::Added => self.added += count,
            SyncStatus::Updated => self.updated += count,
            SyncStatus::Error => self.errors += count,
        }
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a SyncRecord>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.record(record.status, 1);
        }
        stats
    }
}
