//! Wire types for the Mailchimp 2.0 `lists/batch-subscribe` method.

use crate::config::MailchimpConfig;
use crate::models::Grouping;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeVars {
    #[serde(rename = "FNAME", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "LNAME", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
}

/// One subscriber in a batch-subscribe payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubscribeEntry {
    pub email: EmailAddress,
    pub merge_vars: MergeVars,
}

impl BatchSubscribeEntry {
    pub fn new(
        email: impl Into<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        groupings: Vec<Grouping>,
    ) -> Self {
        Self {
            email: EmailAddress {
                email: email.into(),
            },
            merge_vars: MergeVars {
                first_name,
                last_name,
                groupings,
            },
        }
    }
}

/// Create-or-update semantics of a batch-subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubscribeOptions {
    /// Send the opt-in confirmation email before subscribing
    pub double_optin: bool,
    /// Update members that are already on the list instead of erroring
    pub update_existing: bool,
    /// Replace the member's interest groups with the ones sent
    pub replace_interests: bool,
}

impl Default for BatchSubscribeOptions {
    fn default() -> Self {
        Self {
            double_optin: false,
            update_existing: true,
            replace_interests: true,
        }
    }
}

impl From<&MailchimpConfig> for BatchSubscribeOptions {
    fn from(config: &MailchimpConfig) -> Self {
        Self {
            double_optin: config.double_optin,
            update_existing: config.update_existing,
            replace_interests: config.replace_interests,
        }
    }
}

/// Request body sent to `lists/batch-subscribe.json`
#[derive(Debug, Serialize)]
pub(crate) struct BatchSubscribeRequest<'a> {
    pub apikey: &'a str,
    pub id: &'a str,
    pub batch: &'a [BatchSubscribeEntry],
    pub double_optin: bool,
    pub update_existing: bool,
    pub replace_interests: bool,
}

/// A subscriber the list accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribedEmail {
    pub email: String,
    /// Mailchimp's stable subscriber id
    #[serde(default, deserialize_with = "deserialize_remote_id")]
    pub euid: Option<String>,
    /// Id of the subscriber's entry within this list
    #[serde(default, deserialize_with = "deserialize_remote_id")]
    pub leid: Option<String>,
}

impl SubscribedEmail {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            euid: None,
            leid: None,
        }
    }

    pub fn with_ids(mut self, euid: impl Into<String>, leid: impl Into<String>) -> Self {
        self.euid = Some(euid.into());
        self.leid = Some(leid.into());
        self
    }
}

/// A subscriber the list rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeError {
    pub email: ErrorEmail,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SubscribeError {
    pub fn new(email: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            email: ErrorEmail {
                email: email.into(),
                euid: None,
                leid: None,
            },
            code: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEmail {
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_remote_id")]
    pub euid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_remote_id")]
    pub leid: Option<String>,
}

/// Result of one batch-subscribe call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubscribeResult {
    #[serde(default)]
    pub add_count: i64,
    #[serde(default)]
    pub adds: Vec<SubscribedEmail>,
    #[serde(default)]
    pub update_count: i64,
    #[serde(default)]
    pub updates: Vec<SubscribedEmail>,
    #[serde(default)]
    pub error_count: i64,
    #[serde(default)]
    pub errors: Vec<SubscribeError>,
}

/// Mailchimp returns ids as strings or bare numbers depending on the field
/// and API version; keep them as strings either way.
fn deserialize_remote_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value: Option<Value> = Option::deserialize(deserializer)?;

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "Remote id must be a string or number, got {other}"
        ))),
    }
}
