use crate::constants::GROUP_CONTACT_ADDED;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Membership of a contact in a local group
/// Maps to `civicrm_group_contact` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupContact {
    pub id: i64,
    pub group_id: i64,
    pub contact_id: i64,
    pub status: String,
}

impl GroupContact {
    pub fn is_added(&self) -> bool {
        self.status == GROUP_CONTACT_ADDED
    }
}

/// Maps to `civicrm_contact` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_opt_out: bool,
    pub do_not_email: bool,
}

impl Contact {
    pub fn new(id: i64, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            is_opt_out: false,
            do_not_email: false,
        }
    }
}

/// Maps to `civicrm_email` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Email {
    pub id: i64,
    pub contact_id: i64,
    pub email: Option<String>,
    pub is_primary: bool,
    /// Non-zero when bounces or manual action put the address on hold
    pub on_hold: i32,
}

impl Email {
    pub fn primary(id: i64, contact_id: i64, email: &str) -> Self {
        Self {
            id,
            contact_id,
            email: Some(email.to_string()),
            is_primary: true,
            on_hold: 0,
        }
    }

    /// The address, if it is present and not blank
    pub fn address(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    pub fn is_on_hold(&self) -> bool {
        self.on_hold != 0
    }
}

/// A membership resolved to its contact and primary email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleContact {
    pub contact: Contact,
    pub email: Option<Email>,
}

impl EligibleContact {
    /// Usable address when no suppression flag is set
    pub fn sendable_address(&self) -> Option<&str> {
        if self.contact.is_opt_out || self.contact.do_not_email {
            return None;
        }
        let email = self.email.as_ref()?;
        if email.is_on_hold() {
            return None;
        }
        email.address()
    }
}
