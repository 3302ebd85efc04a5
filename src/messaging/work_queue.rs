//! # Work Queue
//!
//! FIFO queue of batch tasks. The orchestrator constructs one explicitly and
//! lends it to the runner; nothing looks a queue up from global state.

use crate::error::Result;
use crate::models::BatchTask;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A task claimed from the queue, together with its storage id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub task: BatchTask,
}

/// Persistent FIFO of batch tasks.
///
/// `dequeue_next` claims the oldest unclaimed item. A claimed item is either
/// removed with `complete` once its task ran, or handed back with `release`
/// so it stays in the queue for inspection after an aborted run.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    fn name(&self) -> &str;

    /// Drop every item, claimed or not. Returns how many were removed.
    async fn reset(&self) -> Result<u64>;

    async fn enqueue(&self, task: &BatchTask) -> Result<i64>;

    async fn dequeue_next(&self) -> Result<Option<QueueItem>>;

    async fn complete(&self, item: &QueueItem) -> Result<()>;

    async fn release(&self, item: &QueueItem) -> Result<()>;

    /// Items still in the queue, claimed or not
    async fn len(&self) -> Result<u64>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
