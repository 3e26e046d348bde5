//! FastMusic core: title normalization and the pure search/download state machine.
mod effect;
mod item;
mod msg;
mod quality;
mod source;
mod state;
mod title;
mod update;
mod view_model;

pub use effect::{DownloadJob, DownloadRequest, Effect};
pub use item::{DownloadId, SearchId, SearchResultItem};
pub use msg::Msg;
pub use quality::{AudioQuality, ParseQualityError};
pub use source::{
    is_supported_url, thumbnail_url, Locator, LocatorError, MediaSource, SourceError,
};
pub use state::AppState;
pub use title::{normalize_title, BOILERPLATE_PHRASES};
pub use update::update;
pub use view_model::{AppViewModel, ResultRowView};
