use chrono::prelude::*;
use url::Url;

/// A network response seen by the browser page, with its body already read.
#[derive(Debug, Clone)]
pub struct ObservedResponse {
    pub url: Url,
    pub status: u16,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl ObservedResponse {
    pub fn new(url: Url, status: u16, body: impl Into<String>) -> Self {
        Self {
            url,
            status,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}
