use crate::{AudioQuality, DownloadId, SearchId, SearchResultItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the search input.
    QueryChanged(String),
    /// User submitted the current search input.
    SearchSubmitted,
    /// Backend answered a search. `Err` carries a user-facing message.
    SearchCompleted {
        search_id: SearchId,
        result: Result<Vec<SearchResultItem>, String>,
    },
    /// User edited the direct-URL input.
    UrlChanged(String),
    /// User submitted the direct-URL input for download.
    UrlSubmitted,
    /// User clicked download on a search row.
    DownloadClicked { video_id: String, title: String },
    /// User picked a bitrate for subsequent downloads.
    QualitySelected(AudioQuality),
    /// A download settled. `Ok` carries the saved file name, `Err` a
    /// user-facing message.
    DownloadFinished {
        id: DownloadId,
        result: Result<String, String>,
    },
}
