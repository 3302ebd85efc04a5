//! # Batch Executor
//!
//! Syncs one offset-addressed slice of group memberships to Mailchimp and
//! records the per-email outcome in the status table.
//!
//! ## Flow
//!
//! 1. Resolve the configured sync targets (no targets: nothing to do)
//! 2. Page the "Added" memberships of those groups, ordered by membership id
//! 3. Resolve each member's contact and primary email, skipping suppressed or
//!    email-less contacts while still remembering every known email id
//! 4. One batch-subscribe call per list
//! 5. Map every returned email back to its email id and write a record
//!
//! A failed remote call fails the whole batch. Records already written for
//! earlier lists of the same batch are kept.

use crate::constants::SyncStatus;
use crate::database::{ContactStore, SyncStatusStore};
use crate::error::Result;
use crate::logging::log_batch_operation;
use crate::mailchimp::{BatchSubscribeEntry, BatchSubscribeOptions, BatchSubscribeResult, ListApi};
use crate::models::{BatchTask, EligibleContact, SyncRecord, SyncStats, SyncTarget};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub offset: i64,
    /// Membership rows in the slice
    pub members: usize,
    /// Members whose contact row no longer exists
    pub missing_contacts: usize,
    /// Members without a usable primary email
    pub without_email: usize,
    /// Members excluded by opt-out, do-not-email or on-hold
    pub suppressed: usize,
    /// Entries sent to Mailchimp across all lists
    pub submitted: usize,
    /// Records written to the status table
    pub written: SyncStats,
    /// Returned emails that matched no known email id
    pub unmatched_emails: Vec<String>,
}

/// Something that can run a dequeued batch task
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, task: &BatchTask) -> Result<BatchReport>;
}

/// Email address to email id, case-insensitive
#[derive(Debug, Default)]
struct EmailIdMap(HashMap<String, i64>);

impl EmailIdMap {
    fn insert(&mut self, email: &str, email_id: i64) {
        self.0.insert(email.trim().to_lowercase(), email_id);
    }

    fn get(&self, email: &str) -> Option<i64> {
        self.0.get(&email.trim().to_lowercase()).copied()
    }
}

pub struct BatchExecutor {
    contacts: Arc<dyn ContactStore>,
    api: Arc<dyn ListApi>,
    status: Arc<dyn SyncStatusStore>,
    options: BatchSubscribeOptions,
}

impl BatchExecutor {
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        api: Arc<dyn ListApi>,
        status: Arc<dyn SyncStatusStore>,
    ) -> Self {
        Self {
            contacts,
            api,
            status,
            options: BatchSubscribeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BatchSubscribeOptions) -> Self {
        self.options = options;
        self
    }

    /// Sync memberships `[offset, offset + batch_size)`
    pub async fn execute(&self, offset: i64, batch_size: i64) -> Result<BatchReport> {
        let mut report = BatchReport {
            offset,
            ..BatchReport::default()
        };

        let targets = self.contacts.sync_targets().await?;
        if targets.is_empty() {
            info!(offset, "No sync targets configured, skipping batch");
            return Ok(report);
        }

        let targets_by_group: HashMap<i64, &SyncTarget> =
            targets.iter().map(|t| (t.group_id, t)).collect();
        let group_ids: Vec<i64> = targets.iter().map(|t| t.group_id).collect();

        let members = self
            .contacts
            .fetch_members(&group_ids, offset, batch_size)
            .await?;
        report.members = members.len();

        let mut email_ids = EmailIdMap::default();
        let mut payloads: BTreeMap<String, Vec<BatchSubscribeEntry>> = BTreeMap::new();

        for member in &members {
            let Some(target) = targets_by_group.get(&member.group_id) else {
                continue;
            };

            let Some(contact) = self.contacts.lookup_contact(member.contact_id).await? else {
                warn!(
                    contact_id = member.contact_id,
                    group_id = member.group_id,
                    "Membership refers to a missing contact"
                );
                report.missing_contacts += 1;
                continue;
            };
            let email = self.contacts.primary_email(contact.id).await?;
            let candidate = EligibleContact { contact, email };

            // Rejections come back keyed by address only, so keep every known
            // address even when the contact is not sent.
            if let Some(email) = &candidate.email {
                if let Some(address) = email.address() {
                    email_ids.insert(address, email.id);
                }
            }

            match candidate.sendable_address() {
                Some(address) => {
                    payloads
                        .entry(target.list_id.clone())
                        .or_default()
                        .push(BatchSubscribeEntry::new(
                            address,
                            candidate.contact.first_name.clone(),
                            candidate.contact.last_name.clone(),
                            target.groupings(),
                        ));
                }
                None if candidate.email.as_ref().and_then(|e| e.address()).is_none() => {
                    debug!(contact_id = candidate.contact.id, "Skipping contact without email");
                    report.without_email += 1;
                }
                None => {
                    debug!(contact_id = candidate.contact.id, "Skipping suppressed contact");
                    report.suppressed += 1;
                }
            }
        }

        for (list_id, batch) in &payloads {
            if batch.is_empty() {
                continue;
            }
            report.submitted += batch.len();

            let result = self
                .api
                .batch_subscribe(list_id, batch, self.options)
                .await?;

            self.record_results(list_id, &result, &email_ids, &mut report)
                .await?;
        }

        log_batch_operation(
            "execute",
            offset,
            batch_size,
            "completed",
            Some(&format!(
                "members={} submitted={} added={} updated={} errors={}",
                report.members,
                report.submitted,
                report.written.added,
                report.written.updated,
                report.written.errors
            )),
        );
        Ok(report)
    }

    async fn record_results(
        &self,
        list_id: &str,
        result: &BatchSubscribeResult,
        email_ids: &EmailIdMap,
        report: &mut BatchReport,
    ) -> Result<()> {
        for add in &result.adds {
            self.record(
                list_id,
                &add.email,
                SyncStatus::Added,
                (add.euid.clone(), add.leid.clone()),
                email_ids,
                report,
            )
            .await?;
        }

        for update in &result.updates {
            self.record(
                list_id,
                &update.email,
                SyncStatus::Updated,
                (update.euid.clone(), update.leid.clone()),
                email_ids,
                report,
            )
            .await?;
        }

        for error in &result.errors {
            warn!(
                list_id,
                email = %error.email.email,
                code = error.code,
                error = error.error.as_deref().unwrap_or("unknown"),
                "Mailchimp rejected subscriber"
            );
            self.record(
                list_id,
                &error.email.email,
                SyncStatus::Error,
                (None, None),
                email_ids,
                report,
            )
            .await?;
        }

        Ok(())
    }

    async fn record(
        &self,
        list_id: &str,
        email: &str,
        status: SyncStatus,
        (remote_user_id, remote_list_entry_id): (Option<String>, Option<String>),
        email_ids: &EmailIdMap,
        report: &mut BatchReport,
    ) -> Result<()> {
        let Some(email_id) = email_ids.get(email) else {
            warn!(
                list_id,
                email,
                status = %status,
                "Returned email has no known email id; membership data changed during the run"
            );
            report.unmatched_emails.push(email.to_string());
            return Ok(());
        };

        let record = SyncRecord::new(email_id, list_id, status)
            .with_remote_ids(remote_user_id, remote_list_entry_id);
        self.status.create(&record).await?;
        report.written.record(status, 1);
        Ok(())
    }
}

#[async_trait]
impl BatchHandler for BatchExecutor {
    async fn handle(&self, task: &BatchTask) -> Result<BatchReport> {
        self.execute(task.offset, task.batch_size).await
    }
}
