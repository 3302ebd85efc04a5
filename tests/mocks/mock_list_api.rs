//! Recording [`ListApi`] double with scripted failures and rejections.

#![allow(dead_code)]

use async_trait::async_trait;
use mailchimp_sync::mailchimp::{
    BatchSubscribeEntry, BatchSubscribeOptions, BatchSubscribeResult, ListApi, SubscribeError,
    SubscribedEmail,
};
use mailchimp_sync::{Result, SyncError};
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub list_id: String,
    pub batch: Vec<BatchSubscribeEntry>,
    pub options: BatchSubscribeOptions,
}

impl RecordedCall {
    pub fn emails(&self) -> Vec<String> {
        self.batch.iter().map(|e| e.email.email.clone()).collect()
    }
}

/// Accepts every address: first sighting per list is an add, later ones are
/// updates. Addresses in `rejected` come back as errors.
#[derive(Default)]
pub struct MockListApi {
    calls: Mutex<Vec<RecordedCall>>,
    subscribed: Mutex<HashSet<(String, String)>>,
    rejected: Mutex<HashSet<String>>,
    fail_on_call: Mutex<Option<usize>>,
}

impl MockListApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th call (1-based, counted over the mock's lifetime) fail
    pub fn failing_on_call(self, n: usize) -> Self {
        *self.fail_on_call.lock() = Some(n);
        self
    }

    pub fn rejecting(self, email: &str) -> Self {
        self.rejected.lock().insert(email.to_string());
        self
    }

    /// Stop failing; later calls succeed
    pub fn recover(&self) {
        *self.fail_on_call.lock() = None;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().iter().map(|c| c.batch.len()).collect()
    }

    pub fn submitted_emails(&self) -> Vec<String> {
        self.calls.lock().iter().flat_map(RecordedCall::emails).collect()
    }
}

#[async_trait]
impl ListApi for MockListApi {
    async fn batch_subscribe(
        &self,
        list_id: &str,
        batch: &[BatchSubscribeEntry],
        options: BatchSubscribeOptions,
    ) -> Result<BatchSubscribeResult> {
        let call_number = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                list_id: list_id.to_string(),
                batch: batch.to_vec(),
                options,
            });
            calls.len()
        };

        if *self.fail_on_call.lock() == Some(call_number) {
            return Err(SyncError::remote_call(list_id, "Invalid_ApiKey: API key is invalid"));
        }

        let rejected = self.rejected.lock().clone();
        let mut subscribed = self.subscribed.lock();
        let mut result = BatchSubscribeResult::default();

        for entry in batch {
            let email = &entry.email.email;
            if rejected.contains(email) {
                result.errors.push(SubscribeError::new(email.as_str(), "Invalid email address"));
            } else if subscribed.insert((list_id.to_string(), email.to_lowercase())) {
                result
                    .adds
                    .push(SubscribedEmail::new(email.as_str()).with_ids(format!("euid-{email}"), "1"));
            } else {
                result
                    .updates
                    .push(SubscribedEmail::new(email.as_str()).with_ids(format!("euid-{email}"), "1"));
            }
        }

        result.add_count = result.adds.len() as i64;
        result.update_count = result.updates.len() as i64;
        result.error_count = result.errors.len() as i64;
        Ok(result)
    }
}
