use super::endpoint::{strip_xssi_prefix, CapturedPayload, Endpoint};
use super::errors::{CaptureError, CaptureResult};
use crate::http::ObservedResponse;
use crate::stats::StatsTracker;
use crate::storage::{StorageBackend, StorageItem};
use log::{debug, error, info, trace, warn};
use serde_json::Value;
use std::sync::Arc;

/// Handles every response a capture page receives.
///
/// Failures are logged and counted here and never reach the session, so one
/// bad body cannot stop later responses from being captured.
pub struct ResponseObserver {
    query: String,
    storage: Arc<dyn StorageBackend>,
    stats: StatsTracker,
}

impl ResponseObserver {
    pub fn new(query: &str, storage: Arc<dyn StorageBackend>, stats: StatsTracker) -> Self {
        Self {
            query: query.to_string(),
            storage,
            stats,
        }
    }

    /// Returns the endpoint stored into `payload`, if any.
    pub async fn handle(
        &self,
        response: &ObservedResponse,
        payload: &mut CapturedPayload,
    ) -> Option<Endpoint> {
        self.stats.record_observed();

        let Some(endpoint) = Endpoint::classify(response.url.as_str()) else {
            trace!("Ignoring response from {}", response.url);
            self.stats.record_ignored();
            return None;
        };

        if !(200..300).contains(&response.status) {
            warn!(
                "{} response from {} returned status {}",
                endpoint, response.url, response.status
            );
            self.stats.record_error_status();
        }

        let data = match Self::decode(response) {
            Ok(data) => data,
            Err(CaptureError::EmptyBody(url)) => {
                debug!("Skipping empty {} response from {}", endpoint, url);
                self.stats.record_empty_body();
                return None;
            }
            Err(e) => {
                error!(
                    "Error processing response (status {}) from {}: {}",
                    response.status, response.url, e
                );
                self.stats.record_parse_failure();
                return None;
            }
        };

        self.stats.record_capture(endpoint, response.body.len());
        self.persist(endpoint, response, &data).await;

        if payload.insert(endpoint, data).is_some() {
            debug!("Replaced previously captured {} data", endpoint);
        }

        Some(endpoint)
    }

    fn decode(response: &ObservedResponse) -> CaptureResult<Value> {
        if response.body.is_empty() {
            return Err(CaptureError::EmptyBody(response.url.to_string()));
        }

        let text = strip_xssi_prefix(&response.body);
        Ok(serde_json::from_str(text)?)
    }

    async fn persist(&self, endpoint: Endpoint, response: &ObservedResponse, data: &Value) {
        let item = StorageItem {
            query: &self.query,
            endpoint,
            timestamp: response.timestamp,
            data,
        };

        match self.storage.store(item).await {
            Ok(path) => info!("Saved {} data to {}", endpoint, path.display()),
            Err(e) => {
                warn!("Error saving {} data: {}", endpoint, CaptureError::from(e));
                self.stats.record_write_failure();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DiskStorage, StorageError};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::path::PathBuf;
    use url::Url;

    const MULTILINE_URL: &str =
        "https://trends.google.com/trends/api/widgetdata/multiline?hl=en-US&tz=0";
    const COMPAREDGEO_URL: &str =
        "https://trends.google.com/trends/api/widgetdata/comparedgeo?hl=en-US&tz=0";

    struct FailingStorage;

    #[async_trait]
    impl StorageBackend for FailingStorage {
        async fn store(&self, _item: StorageItem<'_>) -> Result<PathBuf, StorageError> {
            Err(StorageError::OperationError("disk full".to_string()))
        }
    }

    /// Keeps the timestamp of every item it is asked to store.
    #[derive(Default)]
    struct RecordingStorage {
        timestamps: Mutex<Vec<DateTime<Utc>>>,
    }

    #[async_trait]
    impl StorageBackend for RecordingStorage {
        async fn store(&self, item: StorageItem<'_>) -> Result<PathBuf, StorageError> {
            self.timestamps.lock().push(item.timestamp);
            Ok(PathBuf::from("recorded.json"))
        }
    }

    fn response(url: &str, body: &str) -> ObservedResponse {
        ObservedResponse::new(Url::parse(url).unwrap(), 200, body)
    }

    fn observer(dir: &std::path::Path) -> (ResponseObserver, StatsTracker) {
        let stats = StatsTracker::new();
        let storage = Arc::new(DiskStorage::new(dir, "google_trends_"));
        (ResponseObserver::new("bitcoin", storage, stats.clone()), stats)
    }

    #[tokio::test]
    async fn test_captures_prefixed_multiline() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, _) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        let endpoint = observer
            .handle(
                &response(MULTILINE_URL, ")]}',{\"a\":1}"),
                &mut payload,
            )
            .await;

        assert_eq!(endpoint, Some(Endpoint::InterestOverTime));
        assert_eq!(payload.get(Endpoint::InterestOverTime), Some(&json!({"a": 1})));
        assert!(dir
            .path()
            .join("google_trends_bitcoin_interest_over_time.json")
            .exists());
    }

    #[tokio::test]
    async fn test_unprefixed_body_parsed_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, _) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        observer
            .handle(&response(COMPAREDGEO_URL, "{\"a\":1}"), &mut payload)
            .await;

        assert_eq!(payload.get(Endpoint::InterestByRegion), Some(&json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_ignores_unrelated_urls() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, stats) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        let endpoint = observer
            .handle(
                &response("https://trends.google.com/trends/api/explore", "{\"a\":1}"),
                &mut payload,
            )
            .await;

        assert_eq!(endpoint, None);
        assert!(payload.is_empty());
        assert_eq!(stats.get_stats().responses_ignored, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, stats) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        observer
            .handle(&response(MULTILINE_URL, ""), &mut payload)
            .await;

        assert!(payload.is_empty());
        assert_eq!(stats.get_stats().empty_bodies, 1);
    }

    #[tokio::test]
    async fn test_malformed_body_does_not_stop_later_captures() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, stats) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        let first = observer
            .handle(&response(MULTILINE_URL, ")]}'not json"), &mut payload)
            .await;
        let second = observer
            .handle(&response(MULTILINE_URL, ")]}'\n{\"ok\":true}"), &mut payload)
            .await;

        assert_eq!(first, None);
        assert_eq!(second, Some(Endpoint::InterestOverTime));
        assert_eq!(payload.get(Endpoint::InterestOverTime), Some(&json!({"ok": true})));
        assert_eq!(stats.get_stats().parse_failures, 1);
    }

    #[tokio::test]
    async fn test_later_response_overwrites_entry_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, _) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        observer
            .handle(&response(COMPAREDGEO_URL, ")]}',{\"v\":1}"), &mut payload)
            .await;
        observer
            .handle(&response(COMPAREDGEO_URL, ")]}',{\"v\":2}"), &mut payload)
            .await;

        assert_eq!(payload.len(), 1);
        assert_eq!(payload.get(Endpoint::InterestByRegion), Some(&json!({"v": 2})));
        let file = dir
            .path()
            .join("google_trends_bitcoin_interest_by_region.json");
        let written: Value = serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(written, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_payload() {
        let stats = StatsTracker::new();
        let observer = ResponseObserver::new("bitcoin", Arc::new(FailingStorage), stats.clone());
        let mut payload = CapturedPayload::new();

        let endpoint = observer
            .handle(&response(MULTILINE_URL, "{\"a\":1}"), &mut payload)
            .await;

        assert_eq!(endpoint, Some(Endpoint::InterestOverTime));
        assert_eq!(payload.len(), 1);
        assert_eq!(stats.get_stats().write_failures, 1);
    }

    #[tokio::test]
    async fn test_error_status_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let (observer, stats) = observer(dir.path());
        let mut payload = CapturedPayload::new();

        let endpoint = observer
            .handle(
                &ObservedResponse::new(Url::parse(MULTILINE_URL).unwrap(), 429, "Too Many Requests"),
                &mut payload,
            )
            .await;

        assert_eq!(endpoint, None);
        let stats = stats.get_stats();
        assert_eq!(stats.error_statuses, 1);
        assert_eq!(stats.parse_failures, 1);
    }

    #[tokio::test]
    async fn test_stored_item_carries_response_timestamp() {
        let storage = Arc::new(RecordingStorage::default());
        let observer = ResponseObserver::new("bitcoin", storage.clone(), StatsTracker::new());
        let mut payload = CapturedPayload::new();
        let mut observed = response(COMPAREDGEO_URL, "{}");
        observed.timestamp = Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap();

        observer.handle(&observed, &mut payload).await;

        assert_eq!(*storage.timestamps.lock(), vec![observed.timestamp]);
        assert_eq!(observer.stats.get_stats().error_statuses, 0);
    }
}
