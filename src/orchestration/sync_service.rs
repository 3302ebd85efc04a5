//! # Sync Service
//!
//! Owns the work queue and wires the planner, runner and executor together.
//!
//! ```rust,no_run
//! use mailchimp_sync::config::SyncConfig;
//! use mailchimp_sync::database::{InMemoryContactStore, InMemorySyncStatusStore};
//! use mailchimp_sync::mailchimp::MailchimpClient;
//! use mailchimp_sync::messaging::InMemoryWorkQueue;
//! use mailchimp_sync::orchestration::{SyncService, SyncStart};
//! use std::sync::Arc;
//!
//! # async fn example(config: SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let service = SyncService::new(
//!     Arc::new(InMemoryContactStore::new()),
//!     Arc::new(MailchimpClient::new(&config.mailchimp)?),
//!     Arc::new(InMemorySyncStatusStore::new()),
//!     InMemoryWorkQueue::new(&config.sync.queue_name),
//!     &config,
//! );
//!
//! if let SyncStart::Queued { tasks, .. } = service.start().await? {
//!     println!("{} batches queued", tasks.len());
//!     let outcome = service.run().await?;
//!     println!("success: {}", outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```

use super::batch_executor::BatchExecutor;
use super::queue_runner::{ErrorMode, QueueRunner, RunOutcome, StepOutcome};
use crate::config::SyncConfig;
use crate::constants::{end_url, NOTHING_TO_SYNC_MESSAGE, RUNNER_TITLE};
use crate::database::{ContactStore, SyncStatusStore};
use crate::error::Result;
use crate::mailchimp::{BatchSubscribeOptions, ListApi};
use crate::messaging::WorkQueue;
use crate::models::{BatchTask, SyncStats};
use crate::planner;
use std::sync::Arc;
use tracing::info;

/// Result of planning a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStart {
    /// No members to sync; no run was started and the status table is untouched
    NothingToSync { message: String },
    /// Tasks are queued and the status table has been truncated
    Queued { total: i64, tasks: Vec<BatchTask> },
}

pub struct SyncService<Q: WorkQueue> {
    contacts: Arc<dyn ContactStore>,
    status: Arc<dyn SyncStatusStore>,
    executor: BatchExecutor,
    queue: Q,
    batch_size: i64,
    error_mode: ErrorMode,
}

impl<Q: WorkQueue> SyncService<Q> {
    pub fn new(
        contacts: Arc<dyn ContactStore>,
        api: Arc<dyn ListApi>,
        status: Arc<dyn SyncStatusStore>,
        queue: Q,
        config: &SyncConfig,
    ) -> Self {
        let executor = BatchExecutor::new(contacts.clone(), api, status.clone())
            .with_options(BatchSubscribeOptions::from(&config.mailchimp));

        Self {
            contacts,
            status,
            executor,
            queue,
            batch_size: config.sync.batch_size,
            error_mode: config.sync.error_mode,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn executor(&self) -> &BatchExecutor {
        &self.executor
    }

    /// Reset the queue, plan the batches and enqueue them.
    ///
    /// When there is at least one batch the status table is truncated before
    /// anything runs, so it only ever reflects the latest run.
    pub async fn start(&self) -> Result<SyncStart> {
        self.queue.reset().await?;

        let total = self.contacts.member_count_for_groups_to_sync().await?;
        let tasks = planner::plan(total, self.batch_size)?;

        for task in &tasks {
            self.queue.enqueue(task).await?;
        }

        if tasks.is_empty() {
            info!("Nothing to sync");
            return Ok(SyncStart::NothingToSync {
                message: NOTHING_TO_SYNC_MESSAGE.to_string(),
            });
        }

        let discarded = self.status.reset().await?;
        info!(
            total,
            batches = tasks.len(),
            batch_size = self.batch_size,
            discarded_records = discarded,
            "Sync planned"
        );
        Ok(SyncStart::Queued { total, tasks })
    }

    pub fn runner(&self) -> QueueRunner<'_> {
        QueueRunner::new(RUNNER_TITLE, &self.queue, self.error_mode, end_url())
    }

    /// Run every queued task
    pub async fn run(&self) -> Result<RunOutcome> {
        self.runner().run_all(&self.executor).await
    }

    /// Run only the next queued task
    pub async fn run_next(&self) -> Result<StepOutcome> {
        self.runner().run_next(&self.executor).await
    }

    /// Plan and run in one go; `None` when there was nothing to sync
    pub async fn sync(&self) -> Result<Option<RunOutcome>> {
        match self.start().await? {
            SyncStart::NothingToSync { .. } => Ok(None),
            SyncStart::Queued { .. } => self.run().await.map(Some),
        }
    }

    pub async fn stats(&self) -> Result<SyncStats> {
        self.status.stats().await
    }
}
