//! Error types for drift-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use drift_core::{ChangeError, ContextError, Operation};

/// Errors raised by a [`RemoteClient`](crate::remote::RemoteClient).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote index is malformed: {0}")]
    Index(#[from] serde_json::Error),

    #[error("blob '{content_ref}' not found in remote store")]
    BlobNotFound { content_ref: String },

    #[error("invalid content reference '{content_ref}'")]
    InvalidReference { content_ref: String },
}

/// All errors that can arise from pull operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Computing the change list failed; nothing was applied.
    #[error("failed to resolve changes: {0}")]
    Resolution(String),

    /// Remote lookup or download failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A local filesystem operation failed, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("invalid change: {0}")]
    Change(#[from] ChangeError),

    /// Plan file JSON error.
    #[error("plan JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A delete targeted a path outside the context root.
    #[error("refusing to touch {path}: outside the context root")]
    OutsideRoot { path: PathBuf },

    #[error("cancelled")]
    Cancelled,

    /// The task ended without reporting a result (panic or abort).
    #[error("task aborted before reporting a result")]
    TaskAborted,

    /// One or more changes of a run did not apply.
    #[error("{}", incomplete_summary(.failed, *.skipped, *.total))]
    Incomplete {
        failed: Vec<FailedChange>,
        skipped: usize,
        total: usize,
    },
}

/// A change that failed during a run, with its cause.
#[derive(Debug)]
pub struct FailedChange {
    pub path: String,
    pub operation: Operation,
    pub error: SyncError,
}

impl fmt::Display for FailedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.path, self.operation, self.error)
    }
}

fn incomplete_summary(failed: &[FailedChange], skipped: usize, total: usize) -> String {
    let mut out = format!(
        "{} of {total} change(s) failed, {skipped} skipped",
        failed.len()
    );
    for f in failed {
        out.push_str("\n  ");
        out.push_str(&f.to_string());
    }
    out
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`RemoteError::Io`].
pub(crate) fn remote_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RemoteError {
    RemoteError::Io {
        path: path.into(),
        source,
    }
}
