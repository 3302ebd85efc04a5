use crate::constants::VALUE_SEPARATOR;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maps a local group to a remote Mailchimp list and, optionally, a
/// `grouping<SEP>group` sub-segment inside that list.
/// Maps to `civicrm_mailchimp_group_settings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncTarget {
    pub group_id: i64,
    pub list_id: String,
    pub grouping: Option<String>,
}

/// Interest grouping entry sent alongside a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub name: String,
    pub groups: Vec<String>,
}

impl SyncTarget {
    pub fn new(group_id: i64, list_id: impl Into<String>) -> Self {
        Self {
            group_id,
            list_id: list_id.into(),
            grouping: None,
        }
    }

    pub fn with_grouping(mut self, grouping: impl Into<String>, group: impl Into<String>) -> Self {
        self.grouping = Some(format!(
            "{}{}{}",
            grouping.into(),
            VALUE_SEPARATOR,
            group.into()
        ));
        self
    }

    /// Groupings to attach to every subscriber synced through this target
    pub fn groupings(&self) -> Vec<Grouping> {
        self.grouping
            .as_deref()
            .and_then(decode_grouping)
            .into_iter()
            .collect()
    }
}

/// Decode a stored `grouping<SEP>group` value.
///
/// Only the first two parts are used. Empty input, a missing separator or an
/// empty half yields `None`.
pub fn decode_grouping(value: &str) -> Option<Grouping> {
    let mut parts = value.trim().split(VALUE_SEPARATOR);
    let name = parts.next()?.trim();
    let group = parts.next()?.trim();

    if name.is_empty() || group.is_empty() {
        return None;
    }

    Some(Grouping {
        name: name.to_string(),
        groups: vec![group.to_string()],
    })
}
