use crate::{CaptureError, CaptureResult};
use url::Url;

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendsQuery {
    query: String,
    geo: String,
    locale: String,
}

impl TrendsQuery {
    pub fn new(query: &str, geo: &str) -> CaptureResult<Self> {
        Self::with_locale(query, geo, DEFAULT_LOCALE)
    }

    pub fn with_locale(query: &str, geo: &str, locale: &str) -> CaptureResult<Self> {
        if query.trim().is_empty() {
            return Err(CaptureError::InvalidQuery("query must not be empty".into()));
        }
        if geo.trim().is_empty() {
            return Err(CaptureError::InvalidQuery("geo must not be empty".into()));
        }

        Ok(Self {
            query: query.to_string(),
            geo: geo.to_string(),
            locale: locale.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn geo(&self) -> &str {
        &self.geo
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Builds the explore page URL; every parameter is form-encoded.
    pub fn explore_url(&self, base_url: &str) -> CaptureResult<Url> {
        let url = Url::parse_with_params(
            base_url,
            &[
                ("geo", self.geo.as_str()),
                ("q", self.query.as_str()),
                ("hl", self.locale.as_str()),
            ],
        )?;
        Ok(url)
    }
}
