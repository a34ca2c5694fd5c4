use crate::core::Endpoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationError(String),

    #[error("Serialization failed: {0}")]
    SerializationError(String),
}

/// One parsed widget payload, addressed by the query that produced it.
#[derive(Debug, Clone)]
pub struct StorageItem<'a> {
    pub query: &'a str,
    pub endpoint: Endpoint,
    pub timestamp: DateTime<Utc>,
    pub data: &'a Value,
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persists the item, returning where it landed.
    async fn store(&self, item: StorageItem<'_>) -> Result<PathBuf, StorageError>;
}
