//! # Sync Error Types
//!
//! Structured error handling for the sync pipeline using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Remote call failed for list {list_id}: {message}")]
    RemoteCall { list_id: String, message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Invalid batch size: {batch_size} (must be greater than zero)")]
    InvalidBatchSize { batch_size: i64 },

    #[error("Invalid member count: {total}")]
    InvalidTotal { total: i64 },

    #[error("State transition error: {message}")]
    StateTransition { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl SyncError {
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn remote_call(list_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            list_id: list_id.into(),
            message: message.into(),
        }
    }

    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn state_transition(message: impl Into<String>) -> Self {
        Self::StateTransition {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error came from the remote list service
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCall { .. })
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::database("query", err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
