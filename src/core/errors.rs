use crate::storage::base::StorageError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Navigation error: {0}")]
    NavigationError(String),

    #[error("Navigation did not settle within {0:?}")]
    NavigationTimeout(Duration),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<chromiumoxide::error::CdpError> for CaptureError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        CaptureError::BrowserError(err.to_string())
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;
