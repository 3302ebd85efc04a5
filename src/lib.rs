#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections

//! # Mailchimp Sync
//!
//! Pushes the members of CRM groups into the Mailchimp lists those groups are
//! mapped to, in fixed-size batches driven by a persistent work queue.
//!
//! ## Overview
//!
//! A run has two halves:
//!
//! - **Planning**: count the "Added" memberships of every group with a
//!   configured list, split the count into batches of `batch_size`, and
//!   enqueue one [`models::BatchTask`] per batch. The status table is
//!   truncated before the first batch runs.
//! - **Execution**: a [`orchestration::QueueRunner`] pops tasks in order and
//!   hands each to the [`orchestration::BatchExecutor`], which sends one
//!   batch-subscribe call per list and records every added, updated or
//!   rejected email. The first failed task aborts the run.
//!
//! ## Module Organization
//!
//! - [`planner`] - Batch partitioning
//! - [`orchestration`] - Executor, runner and the service tying them together
//! - [`messaging`] - Work queue trait with in-memory and PostgreSQL queues
//! - [`database`] - Contact and status stores
//! - [`mailchimp`] - Remote list API and its HTTP client
//! - [`state_machine`] - Batch task lifecycle
//! - [`form`] - The "Sync Contacts" surface and completion stats
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod form;
pub mod logging;
pub mod mailchimp;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod planner;
pub mod state_machine;

pub use config::SyncConfig;
pub use constants::SyncStatus;
pub use error::{Result, SyncError};
pub use orchestration::{BatchExecutor, ErrorMode, QueueRunner, RunOutcome, SyncService, SyncStart};
