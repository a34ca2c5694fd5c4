mod browser;
pub mod chrome;
pub mod mock_browser;
pub mod network;

pub use browser::{BrowserDriver, BrowserPage, ResponseReceiver};
pub use chrome::ChromeBrowser;
pub use mock_browser::{MockBrowser, MockEvent, MockResponse};
pub use network::NetworkActivity;
