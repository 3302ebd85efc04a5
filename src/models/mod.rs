//! # Models
//!
//! Rows read from the CRM tables, the sync configuration rows, and the
//! records this crate writes.

pub mod batch_task;
pub mod contact;
pub mod sync_record;
pub mod sync_target;

pub use batch_task::BatchTask;
pub use contact::{Contact, EligibleContact, Email, GroupContact};
pub use sync_record::{SyncRecord, SyncStats};
pub use sync_target::{decode_grouping, Grouping, SyncTarget};
