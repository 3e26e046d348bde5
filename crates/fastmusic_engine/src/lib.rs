//! FastMusic engine: backend client, download orchestration and file output.
mod client;
mod engine;
mod filename;
mod orchestrator;
mod persist;
mod types;

pub use client::{Backend, BackendSettings, ReqwestBackend};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::{derive_filename, parse_content_disposition_filename, PLACEHOLDER_BASE};
pub use orchestrator::run_download;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{AudioPayload, BackendError, EngineEvent, FailureKind, SavedDownload};
