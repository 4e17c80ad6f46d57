//! Change model and path context shared by the drift crates.
//!
//! - [`types`]: [`Change`], [`Operation`] and the metadata on either side
//! - [`context`]: `.drift/` context discovery and logical path resolution
//! - [`error`]: [`ContextError`], [`ChangeError`]

pub mod context;
pub mod error;
pub mod types;

pub use context::{ContextConfig, PathContext, DEFAULT_CONCURRENCY};
pub use error::{ChangeError, ContextError};
pub use types::{normalize_logical, Change, ChangeList, LocalMeta, Operation, RemoteMeta};
