//! # Sync Form
//!
//! The user-facing surface: a single "Sync Contacts" action, plus the
//! completion view reached through the end URL (`state=done`), which shows
//! how many emails were added, updated or rejected.

use crate::error::Result;
use crate::messaging::WorkQueue;
use crate::models::SyncStats;
use crate::orchestration::{RunOutcome, SyncService, SyncStart};
use reqwest::Url;

pub const SUBMIT_LABEL: &str = "Sync Contacts";

/// Anchor for resolving relative end URLs
const STATE_BASE_URL: &str = "http://localhost/";

/// What the user sees after submitting the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// Informational status message; no run was started
    Notice(String),
    /// The run finished or aborted
    Ran(RunOutcome),
}

pub struct SyncForm<'a, Q: WorkQueue> {
    service: &'a SyncService<Q>,
}

impl<'a, Q: WorkQueue> SyncForm<'a, Q> {
    pub fn new(service: &'a SyncService<Q>) -> Self {
        Self { service }
    }

    /// Stats to display when the form is reached with `state=done`
    pub async fn pre_process(&self, state: Option<&str>) -> Result<Option<SyncStats>> {
        match state {
            Some("done") => self.service.stats().await.map(Some),
            _ => Ok(None),
        }
    }

    /// Handle the "Sync Contacts" submission
    pub async fn post_process(&self) -> Result<FormOutcome> {
        match self.service.start().await? {
            SyncStart::NothingToSync { message } => Ok(FormOutcome::Notice(message)),
            SyncStart::Queued { .. } => self.service.run().await.map(FormOutcome::Ran),
        }
    }
}

/// Value of the `state` parameter in an absolute URL, a relative path with a
/// query, or a bare query string. The value is percent-decoded.
pub fn state_param(url: &str) -> Option<String> {
    let base = Url::parse(STATE_BASE_URL).ok()?;
    let parsed = if url.contains('?') || !url.contains('=') {
        base.join(url)
    } else {
        base.join(&format!("?{url}"))
    }
    .ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
}
