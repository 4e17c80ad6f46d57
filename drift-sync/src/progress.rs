//! Progress accounting for one executor run.
//!
//! A [`ProgressTracker`] is created per run and handed to the executor; it
//! is never shared across pulls. Observers plug in through [`ProgressSink`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Observer for progress events. All methods default to no-ops.
pub trait ProgressSink: Send + Sync {
    fn started(&self, _total: usize) {}
    fn advanced(&self, _remaining: usize, _total: usize) {}
    fn finished(&self) {}
}

/// Sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

struct Inner {
    total: AtomicUsize,
    remaining: AtomicUsize,
    finished: AtomicBool,
    sink: Arc<dyn ProgressSink>,
}

/// Counts outstanding apply tasks. Cloning shares the same counter.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Inner>,
}

impl ProgressTracker {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                total: AtomicUsize::new(0),
                remaining: AtomicUsize::new(0),
                finished: AtomicBool::new(false),
                sink,
            }),
        }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(NoProgress))
    }

    /// Set the task count for the run.
    pub fn start(&self, total: usize) {
        self.inner.total.store(total, Ordering::SeqCst);
        self.inner.remaining.store(total, Ordering::SeqCst);
        self.inner.sink.started(total);
    }

    /// Record one completed task. Returns the number still outstanding;
    /// saturates at zero.
    pub fn task_done(&self) -> usize {
        let remaining = match self.inner.remaining.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |n| n.checked_sub(1),
        ) {
            Ok(prev) => prev - 1,
            Err(_) => 0,
        };
        self.inner.sink.advanced(remaining, self.total());
        remaining
    }

    /// A guard that calls [`task_done`](Self::task_done) when dropped, so a
    /// task that panics is still counted.
    pub fn guard(&self) -> TaskGuard {
        TaskGuard {
            tracker: self.clone(),
        }
    }

    /// Signal the end of the run. Only the first call reaches the sink.
    pub fn finish(&self) {
        if !self.inner.finished.swap(true, Ordering::SeqCst) {
            self.inner.sink.finished();
        }
    }

    pub fn total(&self) -> usize {
        self.inner.total.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }
}

/// Decrements its tracker on drop.
pub struct TaskGuard {
    tracker: ProgressTracker,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.task_done();
    }
}
