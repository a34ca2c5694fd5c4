use super::browser::{BrowserDriver, BrowserPage, ResponseReceiver};
use super::network::{pump_network_events, BodySource, NetworkActivity, NetworkEvent};
use crate::core::CaptureConfig;
use crate::http::ObservedResponse;
use crate::{CaptureError, CaptureResult};
use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
    EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::stream::{self, BoxStream, StreamExt};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
const HANDLER_SHUTDOWN: Duration = Duration::from_secs(5);

/// Drives a local Chromium over the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromeBrowser {
    headless: bool,
    idle_window: Duration,
    executable: Option<PathBuf>,
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

impl ChromeBrowser {
    /// `CHROME_BIN` overrides the executable chromiumoxide would detect.
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            headless: config.headless,
            idle_window: config.idle_window,
            executable: std::env::var_os("CHROME_BIN").map(PathBuf::from),
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    fn browser_config(&self, user_data_dir: &Path) -> CaptureResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(user_data_dir);

        if self.headless {
            info!("Launching browser in headless mode");
        } else {
            info!("Launching browser in visible mode");
            builder = builder.with_head();
        }

        if let Some(executable) = &self.executable {
            info!("Using Chrome binary: {}", executable.display());
            builder = builder.chrome_executable(executable);
        }

        builder
            .build()
            .map_err(|e| CaptureError::BrowserError(format!("invalid browser config: {}", e)))
    }
}

#[async_trait]
impl BrowserDriver for ChromeBrowser {
    async fn open_page(
        &self,
        watch: &[String],
    ) -> CaptureResult<(Box<dyn BrowserPage>, ResponseReceiver)> {
        let user_data_dir = profile_dir()?;
        let config = self.browser_config(user_data_dir.path())?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::BrowserError(format!("failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error (ignoring): {}", e);
                }
            }
            debug!("Browser handler task ended");
        });

        let activity = Arc::new(NetworkActivity::new());
        let (sender, receiver) = mpsc::unbounded_channel();

        match attach_page(&browser, watch.to_vec(), Arc::clone(&activity), sender).await {
            Ok((page, pump_task)) => {
                let page = ChromePage {
                    browser,
                    handler_task,
                    pump_task,
                    page,
                    activity,
                    idle_window: self.idle_window,
                    user_data_dir,
                };
                Ok((Box::new(page), receiver))
            }
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!("Error closing browser after failed setup: {}", close_err);
                }
                handler_task.abort();
                Err(e)
            }
        }
    }
}

async fn attach_page(
    browser: &Browser,
    watch: Vec<String>,
    activity: Arc<NetworkActivity>,
    sender: mpsc::UnboundedSender<ObservedResponse>,
) -> CaptureResult<(Page, JoinHandle<()>)> {
    let page = browser.new_page("about:blank").await?;
    page.execute(EnableParams::default()).await?;

    let streams: Vec<BoxStream<'static, NetworkEvent>> = vec![
        page.event_listener::<EventRequestWillBeSent>()
            .await?
            .map(|event| NetworkEvent::Started(event.request_id.inner().clone()))
            .boxed(),
        page.event_listener::<EventResponseReceived>()
            .await?
            .map(|event| NetworkEvent::Received {
                request_id: event.request_id.inner().clone(),
                url: event.response.url.clone(),
                status: u16::try_from(event.response.status).unwrap_or_default(),
            })
            .boxed(),
        page.event_listener::<EventLoadingFinished>()
            .await?
            .map(|event| NetworkEvent::Finished(event.request_id.inner().clone()))
            .boxed(),
        page.event_listener::<EventLoadingFailed>()
            .await?
            .map(|event| NetworkEvent::Failed(event.request_id.inner().clone()))
            .boxed(),
    ];

    let pump_task = tokio::spawn(pump_network_events(
        stream::select_all(streams),
        PageBodies { page: page.clone() },
        watch,
        activity,
        sender,
    ));

    Ok((page, pump_task))
}

struct PageBodies {
    page: Page,
}

#[async_trait]
impl BodySource for PageBodies {
    async fn body(&self, request_id: &str) -> CaptureResult<String> {
        let returns = self
            .page
            .execute(GetResponseBodyParams::new(RequestId::new(request_id)))
            .await?
            .result;

        if returns.base64_encoded {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(returns.body.as_bytes())
                .map_err(|e| CaptureError::BrowserError(format!("invalid base64 body: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|e| CaptureError::BrowserError(format!("body is not UTF-8: {}", e)))
        } else {
            Ok(returns.body)
        }
    }
}

struct ChromePage {
    browser: Browser,
    handler_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
    page: Page,
    activity: Arc<NetworkActivity>,
    idle_window: Duration,
    user_data_dir: TempDir,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&mut self, url: &Url) -> CaptureResult<()> {
        info!("Navigating to: {}", url);
        self.activity.mark_navigation();
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| CaptureError::NavigationError(e.to_string()))?;

        self.activity.wait_for_idle(self.idle_window).await;
        debug!("Network idle after navigating to {}", url);
        Ok(())
    }

    async fn reload(&mut self) -> CaptureResult<()> {
        info!("Reloading page");
        self.activity.mark_navigation();
        self.page
            .reload()
            .await
            .map_err(|e| CaptureError::NavigationError(e.to_string()))?;

        self.activity.wait_for_idle(self.idle_window).await;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> CaptureResult<()> {
        self.page.evaluate(SCROLL_TO_BOTTOM).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> CaptureResult<()> {
        let ChromePage {
            mut browser,
            mut handler_task,
            pump_task,
            user_data_dir,
            ..
        } = *self;

        pump_task.abort();
        let closed = browser.close().await;
        match tokio::time::timeout(HANDLER_SHUTDOWN, &mut handler_task).await {
            Ok(Err(e)) => debug!("Browser handler task did not finish cleanly: {}", e),
            Err(_) => handler_task.abort(),
            Ok(Ok(())) => {}
        }
        if let Err(e) = user_data_dir.close() {
            debug!("Failed to clean up user data dir: {}", e);
        }

        closed?;
        info!("Browser closed");
        Ok(())
    }
}

/// Fresh Chromium profile. The directory is removed when the guard drops.
fn profile_dir() -> CaptureResult<TempDir> {
    let dir = tempfile::Builder::new()
        .prefix("trends-capture-profile-")
        .tempdir()?;
    debug!("Using isolated user data dir: {}", dir.path().display());
    Ok(dir)
}
