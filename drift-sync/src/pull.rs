//! Pull entrypoint: lookup → resolve → confirm → execute.

use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use drift_core::{normalize_logical, Change, ChangeList, LocalMeta, PathContext, RemoteMeta};

use crate::apply::LocalApplier;
use crate::error::{io_err, SyncError};
use crate::executor::{ChangeExecutor, ExecutionReport};
use crate::progress::{NoProgress, ProgressSink, ProgressTracker};
use crate::remote::RemoteClient;

/// Produces the ordered change list for a path.
#[async_trait]
pub trait ChangeResolver: Send + Sync {
    async fn resolve(
        &self,
        path: &str,
        remote: Option<&RemoteMeta>,
        local: Option<&LocalMeta>,
    ) -> Result<ChangeList, SyncError>;
}

/// Asks whether a non-empty change list should be applied.
pub trait Confirm: Send + Sync {
    fn confirm(&self, changes: &[Change]) -> bool;
}

/// Accepts every change list.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _changes: &[Change]) -> bool {
        true
    }
}

/// Outcome of [`PullOrchestrator::pull`].
#[derive(Debug)]
pub enum PullOutcome {
    /// The remote has nothing at the requested path.
    NothingToPull,
    /// Dry run: these changes *would* have been applied.
    WouldApply { changes: ChangeList },
    /// The change list was not confirmed.
    Declined { pending: usize },
    /// Every change applied.
    Applied(ExecutionReport),
}

pub struct PullOrchestrator {
    context: PathContext,
    remote: Arc<dyn RemoteClient>,
    resolver: Arc<dyn ChangeResolver>,
    confirm: Arc<dyn Confirm>,
    progress: Arc<dyn ProgressSink>,
    window: usize,
    cancel: CancellationToken,
    dry_run: bool,
}

impl PullOrchestrator {
    /// The window size comes from the context configuration.
    pub fn new(
        context: PathContext,
        remote: Arc<dyn RemoteClient>,
        resolver: Arc<dyn ChangeResolver>,
    ) -> Self {
        let window = context.config().concurrency;
        Self {
            context,
            remote,
            resolver,
            confirm: Arc::new(AlwaysConfirm),
            progress: Arc::new(NoProgress),
            window,
            cancel: CancellationToken::new(),
            dry_run: false,
        }
    }

    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Pull `path` from the remote into the local tree.
    ///
    /// Returns [`SyncError::Incomplete`] if any change failed to apply.
    pub async fn pull(&self, path: &str) -> Result<PullOutcome, SyncError> {
        let path = normalize_logical(path);

        let Some(remote) = self.remote.lookup(&path).await? else {
            tracing::info!(path = %path, "remote has nothing at path; nothing to pull");
            return Ok(PullOutcome::NothingToPull);
        };

        let abs = self.context.resolve(&path)?;
        let local = match tokio::fs::metadata(&abs).await {
            Ok(meta) => Some(LocalMeta::from_metadata(&abs, &meta)),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(io_err(&abs, err)),
        };

        let changes = self
            .resolver
            .resolve(&path, Some(&remote), local.as_ref())
            .await?;

        if self.dry_run {
            return Ok(PullOutcome::WouldApply { changes });
        }

        if !changes.is_empty() {
            let confirm = Arc::clone(&self.confirm);
            let preview = changes.clone();
            let accepted = tokio::task::spawn_blocking(move || confirm.confirm(&preview))
                .await
                .map_err(|_| SyncError::TaskAborted)?;
            if !accepted {
                return Ok(PullOutcome::Declined {
                    pending: changes.len(),
                });
            }
        }

        let applier = LocalApplier::new(self.context.clone(), Arc::clone(&self.remote));
        let executor = ChangeExecutor::new(Arc::new(applier))
            .with_window(self.window)
            .with_cancel(self.cancel.clone());
        let tracker = ProgressTracker::new(Arc::clone(&self.progress));
        let report = executor.run(changes, &tracker).await;
        Ok(PullOutcome::Applied(report.into_result()?))
    }
}
