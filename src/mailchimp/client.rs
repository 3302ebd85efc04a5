//! # Mailchimp API Client
//!
//! HTTP client for the Mailchimp 2.0 list API. The data centre is taken from
//! the API key suffix unless a base URL is configured explicitly.

use super::types::{
    BatchSubscribeEntry, BatchSubscribeOptions, BatchSubscribeRequest, BatchSubscribeResult,
};
use super::ListApi;
use crate::config::{data_center, MailchimpConfig};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const BATCH_SUBSCRIBE_PATH: &str = "2.0/lists/batch-subscribe.json";

#[derive(Clone)]
pub struct MailchimpClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for MailchimpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"********")
            .finish()
    }
}

impl MailchimpClient {
    pub fn new(config: &MailchimpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SyncError::configuration("mailchimp.api_key is not set"))?;

        let base = match &config.base_url {
            Some(url) => url.clone(),
            None => {
                let dc = data_center(&api_key).ok_or_else(|| {
                    SyncError::configuration("mailchimp.api_key has no data centre suffix")
                })?;
                format!("https://{dc}.api.mailchimp.com/")
            }
        };
        let base = if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        };
        let base_url = Url::parse(&base)
            .map_err(|e| SyncError::configuration(format!("Invalid Mailchimp URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("mailchimp-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::configuration(format!("Failed to create HTTP client: {e}")))?;

        info!(base_url = %base_url, timeout_ms = config.timeout_ms, "Created Mailchimp client");

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join(BATCH_SUBSCRIBE_PATH)
            .map_err(|e| SyncError::configuration(format!("Invalid Mailchimp URL: {e}")))
    }
}

#[async_trait]
impl ListApi for MailchimpClient {
    async fn batch_subscribe(
        &self,
        list_id: &str,
        batch: &[BatchSubscribeEntry],
        options: BatchSubscribeOptions,
    ) -> Result<BatchSubscribeResult> {
        let request = BatchSubscribeRequest {
            apikey: &self.api_key,
            id: list_id,
            batch,
            double_optin: options.double_optin,
            update_existing: options.update_existing,
            replace_interests: options.replace_interests,
        };

        debug!(list_id, entries = batch.len(), "Sending batch-subscribe");

        let response = self
            .client
            .post(self.endpoint()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| SyncError::remote_call(list_id, e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::remote_call(list_id, format!("unreadable response: {e}")))?;

        // Failed calls come back as {"status": "error", "code": .., "name": .., "error": ..}
        if !status.is_success() || body.get("status").and_then(Value::as_str) == Some("error") {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let name = body.get("name").and_then(Value::as_str).unwrap_or("Error");
            return Err(SyncError::remote_call(
                list_id,
                format!("HTTP {status}: {name}: {message}"),
            ));
        }

        let result: BatchSubscribeResult = serde_json::from_value(body)
            .map_err(|e| SyncError::remote_call(list_id, format!("malformed response: {e}")))?;

        debug!(
            list_id,
            adds = result.adds.len(),
            updates = result.updates.len(),
            errors = result.errors.len(),
            "batch-subscribe finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>, base_url: Option<&str>) -> MailchimpConfig {
        MailchimpConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.map(str::to_string),
            ..MailchimpConfig::default()
        }
    }

    #[test]
    fn test_base_url_from_data_center() {
        let client = MailchimpClient::new(&config(Some("abc123-us6"), None)).unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "https://us6.api.mailchimp.com/2.0/lists/batch-subscribe.json"
        );
    }

    #[test]
    fn test_base_url_override_keeps_path() {
        let client =
            MailchimpClient::new(&config(Some("abc123"), Some("http://localhost:9000/mc"))).unwrap();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://localhost:9000/mc/2.0/lists/batch-subscribe.json"
        );
    }

    #[test]
    fn test_missing_api_key() {
        assert!(MailchimpClient::new(&config(None, None)).is_err());
        assert!(MailchimpClient::new(&config(Some("  "), None)).is_err());
    }

    #[test]
    fn test_debug_masks_key() {
        let client = MailchimpClient::new(&config(Some("topsecret-us1"), None)).unwrap();
        assert!(!format!("{client:?}").contains("topsecret"));
    }
}
