mod config;
pub mod endpoint;
mod errors;
pub mod observer;
mod session;


pub use config::CaptureConfig;
pub use endpoint::{strip_xssi_prefix, CapturedPayload, Endpoint};
pub use errors::{CaptureError, CaptureResult};
pub use observer::ResponseObserver;
pub use session::CaptureSession;
