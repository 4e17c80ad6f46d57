//! Directory-backed remote store.
//!
//! Layout:
//!
//! ```text
//! <store>/
//!   index.json          { "entries": { "<logical path>": RemoteMeta, ... } }
//!   blobs/<content_ref> raw bytes
//! ```
//!
//! Directories need no index entry of their own: any prefix of an indexed
//! path is reported as a directory, and the empty path is the store root.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drift_core::{normalize_logical, RemoteMeta};

use crate::error::{remote_io_err, RemoteError};
use crate::remote::{BlobStream, RemoteClient};

pub const INDEX_FILE: &str = "index.json";
pub const BLOBS_DIR: &str = "blobs";

/// On-disk index of a [`DirStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIndex {
    #[serde(default)]
    pub entries: BTreeMap<String, RemoteMeta>,
}

/// A [`RemoteClient`] reading from a local directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Path of the blob for `content_ref`. References are single path
    /// segments; anything else is rejected.
    pub fn blob_path(&self, content_ref: &str) -> Result<PathBuf, RemoteError> {
        let valid = !content_ref.is_empty()
            && content_ref != "."
            && content_ref != ".."
            && !content_ref.contains(['/', '\\']);
        if !valid {
            return Err(RemoteError::InvalidReference {
                content_ref: content_ref.to_string(),
            });
        }
        Ok(self.root.join(BLOBS_DIR).join(content_ref))
    }

    pub async fn load_index(&self) -> Result<StoreIndex, RemoteError> {
        let path = self.index_path();
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| remote_io_err(&path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the index atomically (`.tmp` + rename).
    pub async fn save_index(&self, index: &StoreIndex) -> Result<(), RemoteError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| remote_io_err(&self.root, e))?;
        let path = self.index_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(index)?;
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| remote_io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| remote_io_err(&path, e))
    }

    /// Store `bytes` under `content_ref`.
    pub async fn put_blob(&self, content_ref: &str, bytes: &[u8]) -> Result<(), RemoteError> {
        let path = self.blob_path(content_ref)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| remote_io_err(dir, e))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| remote_io_err(&path, e))
    }
}

fn directory_meta(id: &str, mod_time: DateTime<Utc>) -> RemoteMeta {
    RemoteMeta {
        id: id.to_string(),
        content_ref: String::new(),
        is_dir: true,
        mod_time,
        size: 0,
    }
}

#[async_trait]
impl RemoteClient for DirStore {
    async fn lookup(&self, path: &str) -> Result<Option<RemoteMeta>, RemoteError> {
        let index = self.load_index().await?;
        let key = normalize_logical(path);
        if key.is_empty() {
            let modified = tokio::fs::metadata(self.index_path())
                .await
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(Utc::now);
            return Ok(Some(directory_meta("root", modified)));
        }
        if let Some(meta) = index.entries.get(&key) {
            return Ok(Some(meta.clone()));
        }

        let prefix = format!("{key}/");
        let newest_child = index
            .entries
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, meta)| meta.mod_time)
            .max();
        Ok(newest_child.map(|mod_time| directory_meta(&key, mod_time)))
    }

    async fn download(&self, content_ref: &str) -> Result<BlobStream, RemoteError> {
        let path = self.blob_path(content_ref)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(RemoteError::BlobNotFound {
                content_ref: content_ref.to_string(),
            }),
            Err(err) => Err(remote_io_err(path, err)),
        }
    }
}
