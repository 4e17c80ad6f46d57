//! Domain types for a pull run.
//!
//! All local filesystem paths use `PathBuf`; logical (repo-relative) paths are
//! `/`-separated `String`s. All types are serializable via serde so change
//! lists and store indexes can live on disk as JSON.

use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChangeError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of mutation a [`Change`] requires on the local side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Modify,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Modify => write!(f, "modify"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Remote-side metadata for a node in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMeta {
    /// Remote node identifier.
    pub id: String,
    /// Blob reference used to download content. Empty means the change
    /// carries no content (metadata only, or an empty file).
    #[serde(default)]
    pub content_ref: String,
    #[serde(default)]
    pub is_dir: bool,
    pub mod_time: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}

impl RemoteMeta {
    /// `true` when bytes have to be transferred to apply this side.
    pub fn has_content(&self) -> bool {
        !self.content_ref.is_empty()
    }
}

/// Local-side metadata for a node on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalMeta {
    /// Absolute path on the local filesystem.
    pub local_path: PathBuf,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<DateTime<Utc>>,
}

impl LocalMeta {
    /// Build local metadata from a `stat` result.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        Self {
            local_path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            mod_time: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

/// One required mutation between remote and local state for a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Repo-relative logical path.
    pub path: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RemoteMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<LocalMeta>,
}

/// Ordered sequence of changes. Order defines batching only.
pub type ChangeList = Vec<Change>;

impl Change {
    pub fn add(path: impl Into<String>, source: RemoteMeta) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Add,
            source: Some(source),
            destination: None,
        }
    }

    pub fn modify(path: impl Into<String>, source: RemoteMeta, destination: LocalMeta) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Modify,
            source: Some(source),
            destination: Some(destination),
        }
    }

    pub fn delete(path: impl Into<String>, destination: LocalMeta) -> Self {
        Self {
            path: path.into(),
            operation: Operation::Delete,
            source: None,
            destination: Some(destination),
        }
    }

    /// The remote side, required for Add and Modify.
    pub fn source(&self) -> Result<&RemoteMeta, ChangeError> {
        self.source.as_ref().ok_or_else(|| ChangeError::MissingSource {
            path: self.path.clone(),
            operation: self.operation,
        })
    }

    /// The local side, required for Delete.
    pub fn destination(&self) -> Result<&LocalMeta, ChangeError> {
        self.destination
            .as_ref()
            .ok_or_else(|| ChangeError::MissingDestination {
                path: self.path.clone(),
            })
    }

    /// Check that the authoritative side for this operation is present.
    pub fn validate(&self) -> Result<(), ChangeError> {
        match self.operation {
            Operation::Add | Operation::Modify => self.source().map(|_| ()),
            Operation::Delete => self.destination().map(|_| ()),
        }
    }
}

/// Normalise a logical path: strip surrounding slashes and empty or `.`
/// segments. The root is the empty string.
pub fn normalize_logical(path: &str) -> String {
    path.split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
