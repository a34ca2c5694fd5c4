use crate::http::ObservedResponse;
use crate::CaptureResult;
use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

/// Responses of one page, in the order the page received them.
pub type ResponseReceiver = mpsc::UnboundedReceiver<ObservedResponse>;

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Launches a browser and opens a single page in a fresh, isolated context.
    ///
    /// Response listeners are registered before this returns, so nothing the
    /// page loads afterwards is missed. Only responses whose URL contains one
    /// of `watch` need to be forwarded.
    async fn open_page(
        &self,
        watch: &[String],
    ) -> CaptureResult<(Box<dyn BrowserPage>, ResponseReceiver)>;
}

#[async_trait]
pub trait BrowserPage: Send {
    /// Navigates and returns once the network has gone idle.
    async fn goto(&mut self, url: &Url) -> CaptureResult<()>;

    /// Reloads and returns once the network has gone idle.
    async fn reload(&mut self) -> CaptureResult<()>;

    async fn scroll_to_bottom(&mut self) -> CaptureResult<()>;

    /// Shuts the browser down and releases everything it holds.
    async fn close(self: Box<Self>) -> CaptureResult<()>;
}
