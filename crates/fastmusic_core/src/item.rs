use std::fmt;

use serde::{Deserialize, Serialize};

use crate::source::thumbnail_url;

/// One row of a backend search response. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    #[serde(rename = "video_id")]
    pub id: String,
    pub title: String,
    pub channel: String,
    pub duration: String,
}

impl SearchResultItem {
    pub fn thumbnail_url(&self) -> String {
        thumbnail_url(&self.id)
    }
}

/// Identity key of a download: the video id for search rows, a synthetic
/// `url:` key for pasted links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DownloadId(String);

impl DownloadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_direct_url(&self) -> bool {
        self.0.starts_with("url:")
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic id of an issued search; only the latest one may update state.
pub type SearchId = u64;
