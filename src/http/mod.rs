pub(crate) mod query;
pub(crate) mod response;

pub use query::{TrendsQuery, DEFAULT_LOCALE};
pub use response::ObservedResponse;
