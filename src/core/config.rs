use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://trends.google.com/trends/explore";
pub const DEFAULT_FILE_PREFIX: &str = "google_trends_";

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Wait after the network-idle signal and after a reload.
    pub settle_delay: Duration,
    /// Wait after the scroll that triggers lazily loaded widgets.
    pub scroll_settle_delay: Duration,
    /// Quiet period with no in-flight requests that counts as network idle.
    pub idle_window: Duration,
    pub navigation_timeout: Option<Duration>,
    pub headless: bool,
    /// End a settle window as soon as every endpoint has been captured.
    pub complete_early: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("."),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            settle_delay: Duration::from_secs(8),
            scroll_settle_delay: Duration::from_secs(3),
            idle_window: Duration::from_millis(500),
            navigation_timeout: Some(Duration::from_secs(60)),
            headless: true,
            complete_early: false,
        }
    }
}

impl CaptureConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_output_dir<P: AsRef<Path>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_file_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = prefix.to_string();
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_scroll_settle_delay(mut self, delay: Duration) -> Self {
        self.scroll_settle_delay = delay;
        self
    }

    pub fn with_idle_window(mut self, window: Duration) -> Self {
        self.idle_window = window;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_complete_early(mut self, complete_early: bool) -> Self {
        self.complete_early = complete_early;
        self
    }
}
