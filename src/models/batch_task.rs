use serde::{Deserialize, Serialize};

/// One unit of queued work: sync the memberships in
/// `[offset, offset + batch_size)`.
///
/// Batches are disjoint and offset-addressed, so the order in which tasks run
/// only affects the progress labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTask {
    pub offset: i64,
    pub batch_size: i64,
    pub label: String,
}

impl BatchTask {
    pub fn new(offset: i64, batch_size: i64, total: i64) -> Self {
        Self {
            offset,
            batch_size,
            label: format!(
                "Mailchimp Sync - Contacts {} of {}",
                offset.saturating_add(batch_size),
                total
            ),
        }
    }

    /// Exclusive upper bound of the batch range
    pub fn end(&self) -> i64 {
        self.offset.saturating_add(self.batch_size)
    }
}
