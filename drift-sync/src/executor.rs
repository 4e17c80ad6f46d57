//! Windowed change executor.
//!
//! The change list is cut into consecutive windows of at most `window`
//! changes. Every change in a window runs as its own task; the executor
//! waits for the whole window before starting the next one.
//!
//! Failures do not stop the run: every window drains, later windows still
//! start, and each failed change is collected into the [`ExecutionReport`].
//! Cancellation stops new windows from starting; changes never started are
//! reported as skipped.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use drift_core::{Change, ChangeList, Operation, DEFAULT_CONCURRENCY};

use crate::error::{FailedChange, SyncError};
use crate::progress::ProgressTracker;

/// Window size used when none is configured.
pub const DEFAULT_WINDOW: usize = DEFAULT_CONCURRENCY;

/// Applies a single change. Implemented by [`LocalApplier`](crate::apply::LocalApplier).
#[async_trait]
pub trait ApplyChange: Send + Sync {
    async fn apply(&self, change: &Change, cancel: &CancellationToken) -> Result<(), SyncError>;
}

/// Outcome of an executor run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub total: usize,
    /// Size of each window, in the order they ran.
    pub windows: Vec<usize>,
    pub applied: Vec<String>,
    pub failures: Vec<FailedChange>,
    /// Changes never started because the run was cancelled.
    pub skipped: Vec<String>,
}

impl ExecutionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    /// `Ok(self)` when every change applied, otherwise
    /// [`SyncError::Incomplete`] carrying the failed paths.
    pub fn into_result(self) -> Result<Self, SyncError> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(SyncError::Incomplete {
            failed: self.failures,
            skipped: self.skipped.len(),
            total: self.total,
        })
    }
}

pub struct ChangeExecutor {
    applier: Arc<dyn ApplyChange>,
    window: usize,
    cancel: CancellationToken,
}

impl ChangeExecutor {
    pub fn new(applier: Arc<dyn ApplyChange>) -> Self {
        Self {
            applier,
            window: DEFAULT_WINDOW,
            cancel: CancellationToken::new(),
        }
    }

    /// Cap on concurrently applied changes. Zero is treated as one.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Apply `changes` window by window.
    pub async fn run(&self, changes: ChangeList, progress: &ProgressTracker) -> ExecutionReport {
        let total = changes.len();
        progress.start(total);
        tracing::info!(total, window = self.window, "applying changes");

        let mut report = ExecutionReport {
            total,
            ..Default::default()
        };
        let mut pending = changes.into_iter().peekable();
        while pending.peek().is_some() {
            if self.cancel.is_cancelled() {
                report.skipped.extend(pending.by_ref().map(|c| c.path));
                break;
            }
            let batch: Vec<Change> = pending.by_ref().take(self.window).collect();
            report.windows.push(batch.len());
            self.run_window(batch, progress, &mut report).await;
        }

        progress.finish();
        tracing::info!(
            applied = report.applied.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "apply finished"
        );
        report
    }

    async fn run_window(
        &self,
        batch: Vec<Change>,
        progress: &ProgressTracker,
        report: &mut ExecutionReport,
    ) {
        let labels: Vec<(String, Operation)> = batch
            .iter()
            .map(|c| (c.path.clone(), c.operation))
            .collect();
        let mut reported = vec![false; batch.len()];

        let mut tasks = JoinSet::new();
        for (slot, change) in batch.into_iter().enumerate() {
            let applier = Arc::clone(&self.applier);
            let cancel = self.cancel.clone();
            let guard = progress.guard();
            tasks.spawn(async move {
                let _guard = guard;
                let result = if cancel.is_cancelled() {
                    Err(SyncError::Cancelled)
                } else {
                    applier.apply(&change, &cancel).await
                };
                (slot, result)
            });
        }

        // Barrier: drain every task of this window.
        while let Some(joined) = tasks.join_next().await {
            let (slot, result) = match joined {
                Ok(done) => done,
                Err(err) => {
                    tracing::warn!(error = %err, "apply task did not complete");
                    continue;
                }
            };
            reported[slot] = true;
            let (path, operation) = labels[slot].clone();
            match result {
                Ok(()) => {
                    tracing::debug!(path = %path, op = %operation, "applied");
                    report.applied.push(path);
                }
                Err(error) => {
                    tracing::warn!(path = %path, op = %operation, error = %error, "change failed");
                    report.failures.push(FailedChange {
                        path,
                        operation,
                        error,
                    });
                }
            }
        }

        for (slot, (path, operation)) in labels.into_iter().enumerate() {
            if !reported[slot] {
                report.failures.push(FailedChange {
                    path,
                    operation,
                    error: SyncError::TaskAborted,
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
