use super::config::CaptureConfig;
use super::endpoint::{CapturedPayload, Endpoint};
use super::errors::{CaptureError, CaptureResult};
use super::observer::ResponseObserver;
use crate::browsers::{BrowserDriver, BrowserPage, ResponseReceiver};
use crate::http::TrendsQuery;
use crate::stats::StatsTracker;
use crate::storage::{DiskStorage, StorageBackend};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Loads the explore page for one query and collects the widget payloads it
/// fetches in the background.
pub struct CaptureSession {
    driver: Box<dyn BrowserDriver>,
    storage: Arc<dyn StorageBackend>,
    config: CaptureConfig,
    stats: StatsTracker,
}

impl CaptureSession {
    pub fn new(driver: Box<dyn BrowserDriver>, config: CaptureConfig) -> Self {
        Self {
            driver,
            storage: Arc::new(DiskStorage::from_config(&config)),
            config,
            stats: StatsTracker::new(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
        self.storage = storage;
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Counters of the most recent `capture`.
    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    /// Runs the capture. An empty payload means nothing was captured; only
    /// browser and navigation failures are returned as errors, and the browser
    /// is closed in every case once it was launched.
    pub async fn capture(&self, query: &TrendsQuery) -> CaptureResult<CapturedPayload> {
        let url = query.explore_url(&self.config.base_url)?;
        self.stats.reset();
        let observer =
            ResponseObserver::new(query.query(), Arc::clone(&self.storage), self.stats.clone());
        let mut payload = CapturedPayload::new();

        info!("Opening Google Trends for '{}' in {}...", query.query(), query.geo());
        let (mut page, mut responses) = self
            .driver
            .open_page(&Endpoint::url_fragments())
            .await?;

        let outcome = self
            .drive(page.as_mut(), &url, &mut responses, &observer, &mut payload)
            .await;

        while let Ok(response) = responses.try_recv() {
            observer.handle(&response, &mut payload).await;
        }
        let closed = page.close().await;
        self.stats.finish();

        outcome?;
        if let Err(e) = closed {
            warn!("Error closing browser: {}", e);
        }

        if payload.is_empty() {
            warn!("No Google Trends data was captured.");
        } else {
            info!(
                "Successfully captured data from {} endpoints.",
                payload.len()
            );
        }

        Ok(payload)
    }

    async fn drive(
        &self,
        page: &mut dyn BrowserPage,
        url: &Url,
        responses: &mut ResponseReceiver,
        observer: &ResponseObserver,
        payload: &mut CapturedPayload,
    ) -> CaptureResult<()> {
        self.bounded(page.goto(url)).await?;
        self.settle(self.config.settle_delay, responses, observer, payload)
            .await;

        page.scroll_to_bottom().await?;
        self.settle(self.config.scroll_settle_delay, responses, observer, payload)
            .await;

        if payload.is_empty() {
            warn!("No data captured. Refreshing page...");
            self.stats.record_reload();
            self.bounded(page.reload()).await?;
            self.settle(self.config.settle_delay, responses, observer, payload)
                .await;
        }

        Ok(())
    }

    async fn bounded<F>(&self, navigation: F) -> CaptureResult<()>
    where
        F: Future<Output = CaptureResult<()>>,
    {
        match self.config.navigation_timeout {
            Some(limit) => tokio::time::timeout(limit, navigation)
                .await
                .map_err(|_| CaptureError::NavigationTimeout(limit))?,
            None => navigation.await,
        }
    }

    /// Handles responses as they arrive until `delay` has passed.
    async fn settle(
        &self,
        delay: Duration,
        responses: &mut ResponseReceiver,
        observer: &ResponseObserver,
        payload: &mut CapturedPayload,
    ) {
        let deadline = tokio::time::sleep(delay);
        tokio::pin!(deadline);

        loop {
            if self.config.complete_early && payload.is_complete() {
                debug!("All endpoints captured, ending settle window early");
                return;
            }

            tokio::select! {
                _ = &mut deadline => return,
                received = responses.recv() => match received {
                    Some(response) => {
                        observer.handle(&response, payload).await;
                    }
                    None => {
                        deadline.as_mut().await;
                        return;
                    }
                },
            }
        }
    }
}
