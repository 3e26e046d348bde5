use std::collections::BTreeSet;

use crate::view_model::{AppViewModel, ResultRowView};
use crate::{
    normalize_title, AudioQuality, DownloadId, DownloadJob, DownloadRequest, MediaSource,
    SearchId, SearchResultItem,
};

pub(crate) const SEARCH_FALLBACK_ERROR: &str = "Failed to search. Please try again.";
pub(crate) const DOWNLOAD_FALLBACK_ERROR: &str = "Download failed. Please try again.";
pub(crate) const EMPTY_QUERY_ERROR: &str = "Please enter a search query";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    query: String,
    url_input: String,
    quality: AudioQuality,
    results: Vec<SearchResultItem>,
    next_search_id: SearchId,
    in_flight_search: Option<SearchId>,
    last_completed_query: Option<String>,
    /// Ids whose backend request was issued and has not settled yet.
    pending: BTreeSet<DownloadId>,
    error: Option<String>,
    notice: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let rows = self
            .results
            .iter()
            .map(|item| ResultRowView {
                id: item.id.clone(),
                title: item.title.clone(),
                display_title: normalize_title(&item.title),
                channel: item.channel.clone(),
                duration: item.duration.clone(),
                thumbnail_url: item.thumbnail_url(),
                downloading: self.pending.contains(&DownloadId::new(item.id.clone())),
            })
            .collect();

        AppViewModel {
            query: self.query.clone(),
            url_input: self.url_input.clone(),
            quality: self.quality,
            is_searching: self.in_flight_search.is_some(),
            results: rows,
            pending: self.pending.iter().cloned().collect(),
            error: self.error.clone(),
            notice: self.notice.clone(),
            no_results_for: self.no_results_for(),
            dirty: self.dirty,
        }
    }

    pub fn url_input(&self) -> &str {
        &self.url_input
    }

    pub fn is_pending(&self, id: &DownloadId) -> bool {
        self.pending.contains(id)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight_search.is_none() && self.pending.is_empty()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn no_results_for(&self) -> Option<String> {
        if self.in_flight_search.is_some() || self.error.is_some() || !self.results.is_empty() {
            return None;
        }
        self.last_completed_query.clone()
    }

    pub(crate) fn set_query(&mut self, query: String) {
        if self.query != query {
            self.query = query;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_url_input(&mut self, url: String) {
        if self.url_input != url {
            self.url_input = url;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_quality(&mut self, quality: AudioQuality) {
        if self.quality != quality {
            self.quality = quality;
            self.mark_dirty();
        }
    }

    pub(crate) fn reject(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.notice = None;
        self.mark_dirty();
    }

    /// Returns the id and trimmed query of a new search, or `None` if the
    /// query is blank.
    pub(crate) fn start_search(&mut self) -> Option<(SearchId, String)> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        let query = query.to_string();
        self.next_search_id += 1;
        let search_id = self.next_search_id;
        self.in_flight_search = Some(search_id);
        self.error = None;
        self.notice = None;
        self.mark_dirty();
        Some((search_id, query))
    }

    pub(crate) fn apply_search_result(
        &mut self,
        search_id: SearchId,
        result: Result<Vec<SearchResultItem>, String>,
    ) {
        if self.in_flight_search != Some(search_id) {
            // Superseded by a later search.
            return;
        }
        self.in_flight_search = None;
        self.last_completed_query = Some(self.query.trim().to_string());
        match result {
            Ok(items) => {
                self.results = items;
                self.error = None;
            }
            Err(message) => {
                self.results.clear();
                self.error = Some(non_empty_or(message, SEARCH_FALLBACK_ERROR));
            }
        }
        self.mark_dirty();
    }

    /// Inserts the source into the pending set and builds the job to run.
    /// Returns `None` while a download with the same id is still pending.
    pub(crate) fn begin_download(
        &mut self,
        source: MediaSource,
        display_title: Option<String>,
    ) -> Option<DownloadJob> {
        let id = source.download_id();
        if self.pending.contains(&id) {
            return None;
        }
        self.pending.insert(id.clone());
        self.error = None;
        self.notice = None;
        self.mark_dirty();
        Some(DownloadJob {
            id,
            request: DownloadRequest {
                locator: source.locator(),
                quality: self.quality,
            },
            display_title,
        })
    }

    pub(crate) fn finish_download(&mut self, id: &DownloadId, result: Result<String, String>) {
        if !self.pending.remove(id) {
            return;
        }
        match result {
            Ok(file_name) => {
                self.notice = Some(format!("Saved {file_name}"));
                if id.is_direct_url() {
                    self.url_input.clear();
                }
            }
            Err(message) => {
                self.error = Some(non_empty_or(message, DOWNLOAD_FALLBACK_ERROR));
            }
        }
        self.mark_dirty();
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
