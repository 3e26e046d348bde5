use crate::{AudioQuality, DownloadId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub query: String,
    pub url_input: String,
    pub quality: AudioQuality,
    pub is_searching: bool,
    pub results: Vec<ResultRowView>,
    pub pending: Vec<DownloadId>,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Query of the last search when it completed without results or error.
    pub no_results_for: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn row(&self, index: usize) -> Option<&ResultRowView> {
        self.results.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRowView {
    pub id: String,
    /// Title as sent by the backend.
    pub title: String,
    /// Title after normalization, for display.
    pub display_title: String,
    pub channel: String,
    pub duration: String,
    pub thumbnail_url: String,
    /// The row's download control is disabled while this is set.
    pub downloading: bool,
}
