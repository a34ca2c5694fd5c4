use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix Google prepends to JSON API bodies to break `<script>` inclusion.
pub const XSSI_PREFIX: &str = ")]}'";

const MULTILINE_FRAGMENT: &str = "trends/api/widgetdata/multiline";
const COMPAREDGEO_FRAGMENT: &str = "trends/api/widgetdata/comparedgeo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    InterestOverTime,
    InterestByRegion,
}

impl Endpoint {
    pub const ALL: [Endpoint; 2] = [Endpoint::InterestOverTime, Endpoint::InterestByRegion];

    /// Classifies a response URL by the widget API path it hits.
    ///
    /// A URL naming both fragments resolves to [`Endpoint::InterestOverTime`].
    pub fn classify(url: &str) -> Option<Self> {
        if url.contains(MULTILINE_FRAGMENT) {
            Some(Endpoint::InterestOverTime)
        } else if url.contains(COMPAREDGEO_FRAGMENT) {
            Some(Endpoint::InterestByRegion)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::InterestOverTime => "interest_over_time",
            Endpoint::InterestByRegion => "interest_by_region",
        }
    }

    /// URL fragments a browser driver has to watch for.
    pub fn url_fragments() -> Vec<String> {
        vec![MULTILINE_FRAGMENT.to_string(), COMPAREDGEO_FRAGMENT.to_string()]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removes the anti-hijacking prefix and any commas left directly behind it.
/// Bodies without the prefix come back untouched.
pub fn strip_xssi_prefix(body: &str) -> &str {
    match body.strip_prefix(XSSI_PREFIX) {
        Some(rest) => rest.trim_start_matches(','),
        None => body,
    }
}

/// Parsed widget payloads of one capture session, one per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CapturedPayload {
    entries: BTreeMap<Endpoint, Value>,
}

impl CapturedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `endpoint`, returning the value it replaced.
    pub fn insert(&mut self, endpoint: Endpoint, data: Value) -> Option<Value> {
        self.entries.insert(endpoint, data)
    }

    pub fn get(&self, endpoint: Endpoint) -> Option<&Value> {
        self.entries.get(&endpoint)
    }

    pub fn contains(&self, endpoint: Endpoint) -> bool {
        self.entries.contains_key(&endpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        Endpoint::ALL.iter().all(|endpoint| self.contains(*endpoint))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Endpoint, &Value)> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> BTreeMap<Endpoint, Value> {
        self.entries
    }
}
