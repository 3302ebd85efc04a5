//! # In-Memory Work Queue
//!
//! ```rust
//! use mailchimp_sync::messaging::{InMemoryWorkQueue, WorkQueue};
//! use mailchimp_sync::models::BatchTask;
//!
//! # tokio_test::block_on(async {
//! let queue = InMemoryWorkQueue::new("mc-sync");
//! queue.enqueue(&BatchTask::new(0, 10, 25)).await?;
//! queue.enqueue(&BatchTask::new(10, 10, 25)).await?;
//!
//! let item = queue.dequeue_next().await?.expect("queued");
//! assert_eq!(item.task.offset, 0);
//! queue.complete(&item).await?;
//! assert_eq!(queue.len().await?, 1);
//! # Ok::<(), mailchimp_sync::SyncError>(())
//! # }).unwrap();
//! ```

use super::work_queue::{QueueItem, WorkQueue};
use crate::error::{Result, SyncError};
use crate::models::BatchTask;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Default)]
struct QueueState {
    next_id: i64,
    /// Keyed by id so released items return to their original position
    items: BTreeMap<i64, BatchTask>,
    claimed: HashSet<i64>,
}

/// Process-local queue, used for tests and one-shot runs
#[derive(Debug)]
pub struct InMemoryWorkQueue {
    name: String,
    state: Mutex<QueueState>,
}

impl InMemoryWorkQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Tasks still queued, in dequeue order
    pub fn pending_tasks(&self) -> Vec<BatchTask> {
        let state = self.state.lock();
        state
            .items
            .iter()
            .filter(|(id, _)| !state.claimed.contains(id))
            .map(|(_, task)| task.clone())
            .collect()
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reset(&self) -> Result<u64> {
        let mut state = self.state.lock();
        let removed = state.items.len() as u64;
        state.items.clear();
        state.claimed.clear();
        debug!(queue_name = %self.name, removed, "Queue reset");
        Ok(removed)
    }

    async fn enqueue(&self, task: &BatchTask) -> Result<i64> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.items.insert(id, task.clone());
        Ok(id)
    }

    async fn dequeue_next(&self) -> Result<Option<QueueItem>> {
        let mut state = self.state.lock();
        let next = state
            .items
            .iter()
            .find(|(id, _)| !state.claimed.contains(id))
            .map(|(id, task)| QueueItem {
                id: *id,
                task: task.clone(),
            });

        if let Some(item) = &next {
            state.claimed.insert(item.id);
        }
        Ok(next)
    }

    async fn complete(&self, item: &QueueItem) -> Result<()> {
        let mut state = self.state.lock();
        if !state.claimed.remove(&item.id) {
            return Err(SyncError::queue_operation(
                &self.name,
                "complete",
                format!("item {} is not claimed", item.id),
            ));
        }
        state.items.remove(&item.id);
        Ok(())
    }

    async fn release(&self, item: &QueueItem) -> Result<()> {
        let mut state = self.state.lock();
        if !state.claimed.remove(&item.id) {
            return Err(SyncError::queue_operation(
                &self.name,
                "release",
                format!("item {} is not claimed", item.id),
            ));
        }
        Ok(())
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.state.lock().items.len() as u64)
    }
}
