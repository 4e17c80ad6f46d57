//! Error types for drift-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Operation;

/// All errors that can arise from context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Underlying I/O failure (permission denied, unreadable directory, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse context at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No `.drift/context.yaml` in `start` or any of its ancestors.
    #[error("no drift context found in {start} or any parent; run `drift init` first")]
    NotFound { start: PathBuf },

    /// A logical path tried to leave the context root.
    #[error("path '{path}' escapes the context root")]
    EscapesRoot { path: String },
}

/// A change whose authoritative side is missing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeError {
    #[error("{operation} change for '{path}' has no remote source")]
    MissingSource { path: String, operation: Operation },

    #[error("delete change for '{path}' has no local destination")]
    MissingDestination { path: String },
}
