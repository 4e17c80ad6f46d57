//! Change handlers: one per [`Operation`].
//!
//! [`handler_for`] maps an operation to its handler; [`LocalApplier`] is the
//! executor-facing adapter that dispatches through it.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use tokio_util::sync::CancellationToken;

use drift_core::{Change, Operation, PathContext};

use crate::error::{io_err, SyncError};
use crate::executor::ApplyChange;
use crate::remote::RemoteClient;
use crate::transfer::download_to;

/// What a handler needs to touch: the local tree and the remote store.
#[derive(Clone)]
pub struct ApplyEnv {
    pub context: PathContext,
    pub remote: Arc<dyn RemoteClient>,
}

/// Applies one kind of change to the local filesystem.
#[async_trait]
pub trait ChangeHandler: Send + Sync {
    fn operation(&self) -> Operation;

    async fn apply(
        &self,
        change: &Change,
        env: &ApplyEnv,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError>;
}

pub struct AddHandler;
pub struct ModifyHandler;
pub struct DeleteHandler;

/// The handler responsible for `operation`.
pub fn handler_for(operation: Operation) -> &'static dyn ChangeHandler {
    match operation {
        Operation::Add => &AddHandler,
        Operation::Modify => &ModifyHandler,
        Operation::Delete => &DeleteHandler,
    }
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), SyncError> {
    if cancel.is_cancelled() {
        Err(SyncError::Cancelled)
    } else {
        Ok(())
    }
}

/// Set both access and modification time of `path` to `mod_time`.
async fn set_times(path: &Path, mod_time: DateTime<Utc>) -> Result<(), SyncError> {
    let ft = FileTime::from_unix_time(mod_time.timestamp(), mod_time.timestamp_subsec_nanos());
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || filetime::set_file_times(&target, ft, ft))
        .await
        .map_err(|_| SyncError::TaskAborted)?
        .map_err(|e| io_err(path, e))
}

#[async_trait]
impl ChangeHandler for AddHandler {
    fn operation(&self) -> Operation {
        Operation::Add
    }

    async fn apply(
        &self,
        change: &Change,
        env: &ApplyEnv,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        check_cancel(cancel)?;
        let source = change.source()?;
        let dest = env.context.resolve(&change.path)?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }
        if source.is_dir {
            return tokio::fs::create_dir_all(&dest)
                .await
                .map_err(|e| io_err(&dest, e));
        }

        if source.has_content() {
            download_to(env.remote.as_ref(), source, &dest, cancel).await?;
        } else {
            // Content-less add: make sure the file exists so its time can be set.
            tokio::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&dest)
                .await
                .map_err(|e| io_err(&dest, e))?;
        }
        set_times(&dest, source.mod_time).await
    }
}

#[async_trait]
impl ChangeHandler for ModifyHandler {
    fn operation(&self) -> Operation {
        Operation::Modify
    }

    async fn apply(
        &self,
        change: &Change,
        env: &ApplyEnv,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        check_cancel(cancel)?;
        let source = change.source()?;
        let dest = env.context.resolve(&change.path)?;

        if source.has_content() {
            download_to(env.remote.as_ref(), source, &dest, cancel).await?;
        }
        set_times(&dest, source.mod_time).await
    }
}

#[async_trait]
impl ChangeHandler for DeleteHandler {
    fn operation(&self) -> Operation {
        Operation::Delete
    }

    async fn apply(
        &self,
        change: &Change,
        env: &ApplyEnv,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        check_cancel(cancel)?;
        let target = &change.destination()?.local_path;
        if !env.context.contains(target) || target.as_path() == env.context.root() {
            return Err(SyncError::OutsideRoot {
                path: target.clone(),
            });
        }

        let metadata = match tokio::fs::symlink_metadata(target).await {
            Ok(m) => m,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(io_err(target, err)),
        };
        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(target).await
        } else {
            tokio::fs::remove_file(target).await
        };
        match removed {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(target, err)),
        }
    }
}

/// Applies changes to the local tree through [`handler_for`].
pub struct LocalApplier {
    env: ApplyEnv,
}

impl LocalApplier {
    pub fn new(context: PathContext, remote: Arc<dyn RemoteClient>) -> Self {
        Self {
            env: ApplyEnv { context, remote },
        }
    }
}

#[async_trait]
impl ApplyChange for LocalApplier {
    async fn apply(&self, change: &Change, cancel: &CancellationToken) -> Result<(), SyncError> {
        handler_for(change.operation)
            .apply(change, &self.env, cancel)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
