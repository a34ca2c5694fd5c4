use super::browser::{BrowserDriver, BrowserPage, ResponseReceiver};
use crate::http::ObservedResponse;
use crate::{CaptureError, CaptureResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use url::Url;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub url: Url,
    pub status: u16,
    pub body: String,
    /// Delay after the navigation that triggers it.
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn new(url: Url, body: &str) -> Self {
        Self {
            url,
            status: 200,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Launched,
    Navigated(String),
    Reloaded,
    Scrolled,
    Closed,
}

/// Scripted browser: navigation `n` (the first `goto`, then each reload)
/// replays `loads[n]`; scrolling replays `scroll_responses`.
#[derive(Clone, Default)]
pub struct MockBrowser {
    loads: Arc<Vec<Vec<MockResponse>>>,
    scroll_responses: Arc<Vec<MockResponse>>,
    navigation_delay: Option<Duration>,
    fail_launch: bool,
    fail_navigation: bool,
    events: Arc<Mutex<Vec<MockEvent>>>,
}

impl MockBrowser {
    pub fn new(loads: Vec<Vec<MockResponse>>) -> Self {
        Self {
            loads: Arc::new(loads),
            ..Self::default()
        }
    }

    pub fn with_scroll_responses(mut self, responses: Vec<MockResponse>) -> Self {
        self.scroll_responses = Arc::new(responses);
        self
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn open_page(
        &self,
        _watch: &[String],
    ) -> CaptureResult<(Box<dyn BrowserPage>, ResponseReceiver)> {
        if self.fail_launch {
            return Err(CaptureError::BrowserError("mock launch failure".to_string()));
        }

        self.events.lock().push(MockEvent::Launched);
        let (sender, receiver) = mpsc::unbounded_channel();
        let page = MockPage {
            browser: self.clone(),
            sender,
            loads_served: 0,
        };
        Ok((Box::new(page), receiver))
    }
}

struct MockPage {
    browser: MockBrowser,
    sender: mpsc::UnboundedSender<ObservedResponse>,
    loads_served: usize,
}

impl MockPage {
    fn record(&self, event: MockEvent) {
        self.browser.events.lock().push(event);
    }

    async fn load_next(&mut self) -> CaptureResult<()> {
        if let Some(delay) = self.browser.navigation_delay {
            sleep(delay).await;
        }
        if self.browser.fail_navigation {
            return Err(CaptureError::NavigationError(
                "mock navigation failure".to_string(),
            ));
        }

        let responses = self
            .browser
            .loads
            .get(self.loads_served)
            .cloned()
            .unwrap_or_default();
        self.loads_served += 1;
        self.emit(responses);
        Ok(())
    }

    fn emit(&self, responses: Vec<MockResponse>) {
        for response in responses {
            let observed = ObservedResponse::new(response.url, response.status, response.body);
            match response.delay {
                None => {
                    let _ = self.sender.send(observed);
                }
                Some(delay) => {
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        sleep(delay).await;
                        let _ = sender.send(observed);
                    });
                }
            }
        }
    }
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn goto(&mut self, url: &Url) -> CaptureResult<()> {
        self.record(MockEvent::Navigated(url.to_string()));
        self.load_next().await
    }

    async fn reload(&mut self) -> CaptureResult<()> {
        self.record(MockEvent::Reloaded);
        self.load_next().await
    }

    async fn scroll_to_bottom(&mut self) -> CaptureResult<()> {
        self.record(MockEvent::Scrolled);
        let responses = self.browser.scroll_responses.as_ref().clone();
        self.emit(responses);
        Ok(())
    }

    async fn close(self: Box<Self>) -> CaptureResult<()> {
        self.record(MockEvent::Closed);
        Ok(())
    }
}
