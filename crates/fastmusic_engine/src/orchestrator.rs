use fastmusic_core::DownloadJob;
use fm_logging::{fm_info, fm_warn};

use crate::filename::derive_filename;
use crate::persist::AtomicFileWriter;
use crate::{Backend, BackendError, FailureKind, SavedDownload};

/// Fetches the converted audio for `job` and saves it under `writer`.
///
/// Nothing is written when the backend call fails. The saved name comes
/// from the response's `Content-Disposition` hint, else from the job's
/// display title; an existing file with that name is never overwritten.
pub async fn run_download(
    backend: &dyn Backend,
    writer: &AtomicFileWriter,
    job: &DownloadJob,
) -> Result<SavedDownload, BackendError> {
    fm_info!("download {} started ({})", job.id, job.request.quality);

    let payload = match backend.download(&job.request).await {
        Ok(payload) => payload,
        Err(err) => {
            fm_warn!("download {} failed: {} ({})", job.id, err.message, err.kind);
            return Err(err);
        }
    };

    let requested = derive_filename(
        payload.content_disposition.as_deref(),
        job.display_title.as_deref(),
    );
    let byte_len = payload.bytes.len() as u64;

    let writer = writer.clone();
    let name = requested.clone();
    let path = tokio::task::spawn_blocking(move || writer.save(&name, &payload.bytes))
        .await
        .map_err(|err| BackendError::new(FailureKind::Io, format!("Could not save file: {err}")))??;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(requested);
    fm_info!("download {} saved to {} ({} bytes)", job.id, path.display(), byte_len);

    Ok(SavedDownload {
        file_name,
        path,
        byte_len,
    })
}
