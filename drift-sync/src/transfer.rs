//! Blob transfer: stream remote content into a local file.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use drift_core::RemoteMeta;

use crate::error::{io_err, SyncError};
use crate::remote::RemoteClient;

/// Create (or truncate) `dest` and copy the blob behind `source.content_ref`
/// into it verbatim. Returns the number of bytes written.
///
/// The file handle and the remote stream are both dropped on every exit
/// path. On success the file is flushed and synced so write-back errors are
/// reported instead of lost on close.
pub async fn download_to(
    remote: &dyn RemoteClient,
    source: &RemoteMeta,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<u64, SyncError> {
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    let mut file = File::create(dest).await.map_err(|e| io_err(dest, e))?;
    let mut blob = remote.download(&source.content_ref).await?;
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    let copied = tokio::select! {
        res = tokio::io::copy(&mut blob, &mut file) => res.map_err(|e| io_err(dest, e))?,
        _ = cancel.cancelled() => return Err(SyncError::Cancelled),
    };

    file.flush().await.map_err(|e| io_err(dest, e))?;
    file.sync_all().await.map_err(|e| io_err(dest, e))?;
    tracing::debug!(path = %dest.display(), bytes = copied, "downloaded blob");
    Ok(copied)
}
