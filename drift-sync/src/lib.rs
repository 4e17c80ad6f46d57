//! # drift-sync
//!
//! Change-application engine for pulling a remote tree into a local one.
//!
//! [`PullOrchestrator::pull`] looks up the remote node, asks a
//! [`ChangeResolver`] for the change list, confirms it, and hands it to the
//! [`ChangeExecutor`], which applies it in bounded windows through the
//! per-operation handlers in [`apply`].

pub mod apply;
pub mod error;
pub mod executor;
pub mod plan;
pub mod progress;
pub mod pull;
pub mod remote;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use apply::{handler_for, ChangeHandler, LocalApplier};
pub use error::{FailedChange, RemoteError, SyncError};
pub use executor::{ApplyChange, ChangeExecutor, ExecutionReport, DEFAULT_WINDOW};
pub use plan::PlanResolver;
pub use progress::{NoProgress, ProgressSink, ProgressTracker};
pub use pull::{AlwaysConfirm, ChangeResolver, Confirm, PullOrchestrator, PullOutcome};
pub use remote::{BlobStream, RemoteClient};
pub use store::{DirStore, StoreIndex};
