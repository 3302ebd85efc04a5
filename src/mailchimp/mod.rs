//! # Mailchimp Integration
//!
//! The remote list service is reached through [`ListApi`]; [`MailchimpClient`]
//! is the HTTP implementation.

pub mod client;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;

pub use client::MailchimpClient;
pub use types::{
    BatchSubscribeEntry, BatchSubscribeOptions, BatchSubscribeResult, EmailAddress, ErrorEmail,
    MergeVars, SubscribeError, SubscribedEmail,
};

/// Bulk subscribe/update against one remote list
#[async_trait]
pub trait ListApi: Send + Sync {
    /// Submit `batch` as one call. Any transport, authentication or decoding
    /// failure is returned as [`crate::SyncError::RemoteCall`].
    async fn batch_subscribe(
        &self,
        list_id: &str,
        batch: &[BatchSubscribeEntry],
        options: BatchSubscribeOptions,
    ) -> Result<BatchSubscribeResult>;
}
