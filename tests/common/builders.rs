//! Fixture builders for CRM data and a ready-to-run sync service.

use mailchimp_sync::config::SyncConfig;
use mailchimp_sync::database::{InMemoryContactStore, InMemorySyncStatusStore};
use mailchimp_sync::mailchimp::ListApi;
use mailchimp_sync::messaging::InMemoryWorkQueue;
use mailchimp_sync::models::{Contact, Email, SyncTarget};
use mailchimp_sync::orchestration::{ErrorMode, SyncService};
use std::sync::Arc;

/// Builds an in-memory CRM: groups mapped to lists and their members
pub struct CrmBuilder {
    store: InMemoryContactStore,
    next_contact_id: i64,
}

impl CrmBuilder {
    pub fn new() -> Self {
        Self {
            store: InMemoryContactStore::new(),
            next_contact_id: 1,
        }
    }

    pub fn with_target(self, target: SyncTarget) -> Self {
        self.store.add_target(target);
        self
    }

    /// `count` subscribed members of `group_id`, each with a primary email
    /// `<group>-<n>@example.org`
    pub fn with_members(mut self, group_id: i64, count: usize) -> Self {
        for n in 0..count {
            let address = format!("{group_id}-{n}@example.org");
            self.add_member(group_id, Contact::new(0, "Test", &format!("Member{n}")), Some(&address));
        }
        self
    }

    /// A single member with a custom contact row; returns the contact id
    pub fn add_member(&mut self, group_id: i64, mut contact: Contact, email: Option<&str>) -> i64 {
        let contact_id = self.next_contact_id;
        self.next_contact_id += 1;

        contact.id = contact_id;
        self.store.add_contact(contact);
        if let Some(address) = email {
            self.store
                .add_email(Email::primary(email_id_for(contact_id), contact_id, address));
        }
        self.store.add_membership(group_id, contact_id, "Added");
        contact_id
    }

    pub fn build(self) -> Arc<InMemoryContactStore> {
        Arc::new(self.store)
    }
}

impl Default for CrmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Email ids are derived from contact ids so tests can predict them
pub fn email_id_for(contact_id: i64) -> i64 {
    contact_id + 1000
}

pub fn config_with(batch_size: i64, error_mode: ErrorMode) -> SyncConfig {
    let mut config = SyncConfig::default();
    config.sync.batch_size = batch_size;
    config.sync.error_mode = error_mode;
    config
}

/// A service wired to in-memory stores and queue
pub struct TestHarness {
    pub contacts: Arc<InMemoryContactStore>,
    pub status: Arc<InMemorySyncStatusStore>,
    pub service: SyncService<InMemoryWorkQueue>,
}

impl TestHarness {
    pub fn new(
        contacts: Arc<InMemoryContactStore>,
        api: Arc<dyn ListApi>,
        config: &SyncConfig,
    ) -> Self {
        let status = Arc::new(InMemorySyncStatusStore::new());
        let service = SyncService::new(
            contacts.clone(),
            api,
            status.clone(),
            InMemoryWorkQueue::new(&config.sync.queue_name),
            config,
        );

        Self {
            contacts,
            status,
            service,
        }
    }
}
