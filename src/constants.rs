//! # Sync Constants
//!
//! Fixed names and status values shared by the planner, executor and form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the persistent work queue holding batch tasks
pub const QUEUE_NAME: &str = "mc-sync";

/// Path the runner sends the user to once every task has completed
pub const END_URL: &str = "civicrm/mailchimp/sync";

/// Query parameters appended to [`END_URL`]
pub const END_PARAMS: &str = "state=done";

/// Default number of memberships handled by one batch task
pub const BATCH_COUNT: i64 = 10;

/// Separator between grouping and group in a stored sub-grouping value
pub const VALUE_SEPARATOR: char = '\u{1}';

/// Title shown while the runner works through the queue
pub const RUNNER_TITLE: &str = "Mailchimp Sync";

pub const NOTHING_TO_SYNC_MESSAGE: &str =
    "Nothing to sync. Make sure mailchimp settings are configured for the groups with enough members.";

/// Membership status of a contact in a local group
pub const GROUP_CONTACT_ADDED: &str = "Added";

/// Outcome of pushing one email to one remote list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    Added,
    Updated,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Updated => "Updated",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Added" => Ok(Self::Added),
            "Updated" => Ok(Self::Updated),
            "Error" => Ok(Self::Error),
            _ => Err(format!("Invalid sync status: {s}")),
        }
    }
}

/// Full end-of-run URL, path plus query
pub fn end_url() -> String {
    format!("{END_URL}?{END_PARAMS}")
}
