//! # Orchestration
//!
//! Planning, queue running and batch execution for a sync run.

pub mod batch_executor;
pub mod queue_runner;
pub mod sync_service;

pub use batch_executor::{BatchExecutor, BatchHandler, BatchReport};
pub use queue_runner::{ErrorMode, QueueRunner, RunOutcome, StepOutcome, TaskRun};
pub use sync_service::{SyncService, SyncStart};
