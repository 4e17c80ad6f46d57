//! In-memory remote used by unit tests.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::io::{AsyncRead, ReadBuf};

use drift_core::{normalize_logical, RemoteMeta};

use crate::error::RemoteError;
use crate::remote::{BlobStream, RemoteClient};

pub(crate) fn file_source(content_ref: &str) -> RemoteMeta {
    RemoteMeta {
        id: format!("id-{content_ref}"),
        content_ref: content_ref.to_string(),
        is_dir: false,
        mod_time: Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
        size: 0,
    }
}

#[derive(Default)]
pub(crate) struct MemoryRemote {
    pub nodes: HashMap<String, RemoteMeta>,
    pub blobs: HashMap<String, Vec<u8>>,
    /// Blobs whose stream yields the stored prefix and then fails.
    pub broken: HashMap<String, Vec<u8>>,
    pub lookup_fails: bool,
    pub downloads: AtomicUsize,
    pub released: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn with_blob(mut self, content_ref: &str, bytes: &[u8]) -> Self {
        self.blobs.insert(content_ref.to_string(), bytes.to_vec());
        self
    }

    pub fn with_broken_blob(mut self, content_ref: &str, prefix: &[u8]) -> Self {
        self.broken.insert(content_ref.to_string(), prefix.to_vec());
        self
    }

    pub fn with_node(mut self, path: &str, meta: RemoteMeta) -> Self {
        self.nodes.insert(normalize_logical(path), meta);
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteClient for MemoryRemote {
    async fn lookup(&self, path: &str) -> Result<Option<RemoteMeta>, RemoteError> {
        if self.lookup_fails {
            return Err(RemoteError::Io {
                path: "index".into(),
                source: io::Error::other("connection refused"),
            });
        }
        Ok(self.nodes.get(&normalize_logical(path)).cloned())
    }

    async fn download(&self, content_ref: &str) -> Result<BlobStream, RemoteError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Some(prefix) = self.broken.get(content_ref) {
            return Ok(Box::new(FailingReader {
                chunk: prefix.clone(),
                sent: false,
                released: Arc::clone(&self.released),
            }));
        }
        match self.blobs.get(content_ref) {
            Some(bytes) => Ok(Box::new(io::Cursor::new(bytes.clone()))),
            None => Err(RemoteError::BlobNotFound {
                content_ref: content_ref.to_string(),
            }),
        }
    }
}

/// Yields one chunk, then a connection reset. Records its own drop.
struct FailingReader {
    chunk: Vec<u8>,
    sent: bool,
    released: Arc<AtomicBool>,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.sent {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "stream reset",
            )));
        }
        self.sent = true;
        let n = buf.remaining().min(self.chunk.len());
        buf.put_slice(&self.chunk[..n]);
        Poll::Ready(Ok(()))
    }
}

impl Drop for FailingReader {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
