//! Progress reporting for watched tasks.
//!
//! Callers that want feedback while a task is polled (spinners, log
//! lines) pass a callback; everything here is fire-and-forget and a
//! missing callback costs nothing.

use std::time::Duration;

/// Events emitted while a task watcher runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The watcher has started polling a task.
    Started { task_uid: String },
    /// One poll cycle completed; the task is still in progress.
    Polling {
        task_uid: String,
        status: String,
        elapsed: Duration,
    },
    /// The task reached a successful terminal status.
    Completed { task_uid: String },
    /// The task terminated without success (failed, timed out,
    /// cancelled, or unreachable).
    Failed { task_uid: String, reason: String },
}

/// Callback invoked with progress events.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Invoke the callback if one was provided.
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
