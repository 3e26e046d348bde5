use crate::{AudioQuality, DownloadId, Locator, SearchId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Search { search_id: SearchId, query: String },
    Download(DownloadJob),
}

/// Body of a `POST /download`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub locator: Locator,
    pub quality: AudioQuality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub id: DownloadId,
    pub request: DownloadRequest,
    /// Raw title used for the filename when the backend sends no hint.
    pub display_title: Option<String>,
}
