//! Remote store seam.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use drift_core::RemoteMeta;

use crate::error::RemoteError;

/// Readable blob content. Dropping the stream releases it.
pub type BlobStream = Box<dyn AsyncRead + Send + Unpin>;

/// Client for the remote object store.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Look up the node at a logical path.
    ///
    /// `Ok(None)` means the remote definitively has nothing at `path`; any
    /// failure to find out is an `Err`.
    async fn lookup(&self, path: &str) -> Result<Option<RemoteMeta>, RemoteError>;

    /// Open a content stream for `content_ref`.
    async fn download(&self, content_ref: &str) -> Result<BlobStream, RemoteError>;
}
