use super::base::{StorageBackend, StorageError, StorageItem};
use crate::core::{CaptureConfig, Endpoint};
use async_trait::async_trait;
use log::debug;
use std::path::{Path, PathBuf};

/// Writes each payload to `{prefix}{query}_{endpoint}.json`, replacing any
/// previous file of the same name.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    base_path: PathBuf,
    filename_prefix: String,
}

impl DiskStorage {
    pub fn new<P: AsRef<Path>>(base_path: P, filename_prefix: &str) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            filename_prefix: filename_prefix.to_string(),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(&config.output_dir, &config.file_prefix)
    }

    pub fn path_for(&self, query: &str, endpoint: Endpoint) -> PathBuf {
        self.base_path
            .join(format!("{}{}_{}.json", self.filename_prefix, query, endpoint))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

#[async_trait]
impl StorageBackend for DiskStorage {
    async fn store(&self, item: StorageItem<'_>) -> Result<PathBuf, StorageError> {
        let path = self.path_for(item.query, item.endpoint);
        debug!(
            "Storing {} payload for '{}' (captured {}) at {}",
            item.endpoint,
            item.query,
            item.timestamp.format("%Y-%m-%d %H:%M:%S"),
            path.display()
        );
        let json = serde_json::to_string_pretty(item.data)?;

        tokio::fs::create_dir_all(&self.base_path).await?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}
