pub mod browsers;
pub mod core;
pub mod http;
pub mod stats;
pub mod storage;

pub use browsers::{BrowserDriver, BrowserPage, ChromeBrowser};
pub use core::{CaptureConfig, CaptureSession, CapturedPayload, Endpoint};
pub use core::{CaptureError, CaptureResult};
pub use http::{ObservedResponse, TrendsQuery};
pub use stats::StatsTracker;
pub use storage::DiskStorage;

/// Captures the widget payloads for one query with a headless Chromium and
/// the default configuration, writing them into the working directory.
///
/// `locale` defaults to `en-US`.
pub async fn capture(
    query: &str,
    geo: &str,
    locale: Option<&str>,
) -> CaptureResult<CapturedPayload> {
    let query = TrendsQuery::with_locale(query, geo, locale.unwrap_or(http::DEFAULT_LOCALE))?;
    let config = CaptureConfig::default();
    let session = CaptureSession::new(Box::new(ChromeBrowser::from_config(&config)), config);
    session.capture(&query).await
}
