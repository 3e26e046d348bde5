use crate::state::EMPTY_QUERY_ERROR;
use crate::{AppState, Effect, MediaSource, Msg};

/// Pure update function: applies a message to state and returns any effects.
///
/// Download messages insert into the pending set before the effect is
/// returned, so the id is pending before any request can be issued.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QueryChanged(query) => {
            state.set_query(query);
            Vec::new()
        }
        Msg::SearchSubmitted => match state.start_search() {
            Some((search_id, query)) => vec![Effect::Search { search_id, query }],
            None => {
                state.reject(EMPTY_QUERY_ERROR);
                Vec::new()
            }
        },
        Msg::SearchCompleted { search_id, result } => {
            state.apply_search_result(search_id, result);
            Vec::new()
        }
        Msg::UrlChanged(url) => {
            state.set_url_input(url);
            Vec::new()
        }
        Msg::UrlSubmitted => {
            let url = state.url_input().to_string();
            match MediaSource::direct(&url) {
                Ok(source) => state
                    .begin_download(source, None)
                    .map(Effect::Download)
                    .into_iter()
                    .collect(),
                Err(err) => {
                    state.reject(err.to_string());
                    Vec::new()
                }
            }
        }
        Msg::DownloadClicked { video_id, title } => {
            let source = MediaSource::Search { video_id };
            state
                .begin_download(source, Some(title))
                .map(Effect::Download)
                .into_iter()
                .collect()
        }
        Msg::QualitySelected(quality) => {
            state.set_quality(quality);
            Vec::new()
        }
        Msg::DownloadFinished { id, result } => {
            state.finish_download(&id, result);
            Vec::new()
        }
    };

    (state, effects)
}
