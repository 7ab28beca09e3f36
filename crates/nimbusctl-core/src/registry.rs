//! Result cache and completion signal for watched tasks.
//!
//! Every watcher records exactly one [`TaskOutcome`] when it stops, no
//! matter how it stops. The registry keeps those outcomes for the life
//! of the session and wakes anyone blocked on a completion. The signal
//! is shared by all waiters, so a wake only means "some task finished";
//! waiters must re-check the uid they care about, which
//! [`TaskRegistry::wait_for`] does internally.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::CoreError;

/// How a watched task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// The cluster reported the success status.
    Succeeded,
    /// The cluster reported a terminal status other than success.
    Failed,
    /// The watcher gave up after its polling budget ran out.
    TimedOut,
    /// The watcher was cancelled before the task finished.
    Aborted,
    /// Status fetches kept failing, so the final state is unknown.
    Unreachable,
}

impl Disposition {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Disposition::Succeeded)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Disposition::Succeeded => "succeeded",
            Disposition::Failed => "failed",
            Disposition::TimedOut => "timed_out",
            Disposition::Aborted => "aborted",
            Disposition::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

fn duration_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// The recorded end state of one watched task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    /// Uid of the task this outcome belongs to.
    pub task_uid: String,
    /// How the watch ended.
    pub disposition: Disposition,
    /// Raw status string from the last successful fetch, or "unknown"
    /// when the watcher never saw one.
    pub status: String,
    /// Last task payload fetched from the cluster, or a synthesized
    /// error object for outcomes the cluster never reported.
    pub detail: Value,
    /// Wall time the watcher spent on this task.
    #[serde(rename = "elapsed_secs", serialize_with = "duration_secs")]
    pub elapsed: Duration,
    /// Number of status fetches performed.
    pub polls: u32,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl TaskOutcome {
    /// Outcome for a terminal status reported by the cluster.
    #[must_use]
    pub fn from_remote(
        task_uid: impl Into<String>,
        status: impl Into<String>,
        detail: Value,
        elapsed: Duration,
        polls: u32,
    ) -> Self {
        let status = status.into();
        let disposition = if nimbus_hci::is_success(&status) {
            Disposition::Succeeded
        } else {
            Disposition::Failed
        };
        Self {
            task_uid: task_uid.into(),
            disposition,
            status,
            detail,
            elapsed,
            polls,
            recorded_at: Utc::now(),
        }
    }

    /// Outcome for a watch that exhausted its polling budget.
    #[must_use]
    pub fn timed_out(
        task_uid: impl Into<String>,
        last_status: Option<String>,
        elapsed: Duration,
        polls: u32,
    ) -> Self {
        let last = last_status.unwrap_or_else(|| "unknown".to_string());
        Self {
            task_uid: task_uid.into(),
            disposition: Disposition::TimedOut,
            status: last.clone(),
            detail: serde_json::json!({
                "error": format!("still '{last}' when the polling budget ran out"),
            }),
            elapsed,
            polls,
            recorded_at: Utc::now(),
        }
    }

    /// Outcome for a watch stopped by its cancellation token.
    #[must_use]
    pub fn aborted(
        task_uid: impl Into<String>,
        last_status: Option<String>,
        elapsed: Duration,
        polls: u32,
    ) -> Self {
        Self {
            task_uid: task_uid.into(),
            disposition: Disposition::Aborted,
            status: last_status.unwrap_or_else(|| "unknown".to_string()),
            detail: serde_json::json!({ "error": "watch cancelled" }),
            elapsed,
            polls,
            recorded_at: Utc::now(),
        }
    }

    /// Outcome for a watch that lost contact with the cluster.
    #[must_use]
    pub fn unreachable(
        task_uid: impl Into<String>,
        error: impl Into<String>,
        elapsed: Duration,
        polls: u32,
    ) -> Self {
        Self {
            task_uid: task_uid.into(),
            disposition: Disposition::Unreachable,
            status: "unknown".to_string(),
            detail: serde_json::json!({ "error": error.into() }),
            elapsed,
            polls,
            recorded_at: Utc::now(),
        }
    }

    /// Human-readable reason for a non-success outcome, pulled from the
    /// task payload when the cluster provided one.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        for key in ["error_detail", "message", "error", "reason"] {
            if let Some(text) = self.detail.get(key).and_then(Value::as_str)
                && !text.trim().is_empty()
            {
                return text.trim().to_string();
            }
        }
        format!("task reported status '{}'", self.status)
    }

    /// Convert a non-success outcome into the matching error, or `None`
    /// for a success.
    #[must_use]
    pub fn to_error(&self) -> Option<CoreError> {
        match self.disposition {
            Disposition::Succeeded => None,
            Disposition::Failed => Some(CoreError::TaskFailed {
                task_uid: self.task_uid.clone(),
                reason: self.failure_reason(),
            }),
            Disposition::TimedOut => Some(CoreError::TaskTimeout {
                task_uid: self.task_uid.clone(),
                elapsed: self.elapsed,
            }),
            Disposition::Aborted => Some(CoreError::TaskCancelled {
                task_uid: self.task_uid.clone(),
            }),
            Disposition::Unreachable => Some(CoreError::TaskUnreachable {
                task_uid: self.task_uid.clone(),
                reason: self.failure_reason(),
            }),
        }
    }
}

/// Session-wide cache of task outcomes plus the shared completion
/// signal.
///
/// `record` never overwrites: the first terminal outcome for a uid is
/// the one callers will see, and later attempts are rejected. This is
/// what lets `get` stay idempotent while several parts of a program
/// watch and query the same task.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    outcomes: Mutex<HashMap<String, Arc<TaskOutcome>>>,
    signal: Notify,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Arc<TaskOutcome>>> {
        self.outcomes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a terminal outcome and release the completion signal.
    ///
    /// The cache is write-once per uid: when an outcome already exists
    /// it is kept (and returned) and the new one is dropped. The signal
    /// is released either way, so waiters always get a chance to
    /// re-check.
    pub fn record(&self, outcome: TaskOutcome) -> Arc<TaskOutcome> {
        let stored = {
            let mut cache = self.cache();
            match cache.entry(outcome.task_uid.clone()) {
                Entry::Occupied(slot) => slot.get().clone(),
                Entry::Vacant(slot) => slot.insert(Arc::new(outcome)).clone(),
            }
        };
        self.signal_all();
        stored
    }

    /// Look up the recorded outcome for a task, if any.
    #[must_use]
    pub fn get(&self, task_uid: &str) -> Option<Arc<TaskOutcome>> {
        self.cache().get(task_uid).cloned()
    }

    /// All outcomes recorded so far, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<TaskOutcome>> {
        let mut outcomes: Vec<Arc<TaskOutcome>> = self.cache().values().cloned().collect();
        outcomes.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        outcomes
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }

    /// Wake every waiter currently blocked on the completion signal.
    pub fn signal_all(&self) {
        self.signal.notify_waiters();
    }

    /// Block until the next completion signal.
    ///
    /// The signal is shared: a wake means some task recorded an
    /// outcome, not necessarily the one the caller cares about. Use
    /// [`TaskRegistry::wait_for`] to wait for a specific uid.
    pub async fn wait_for_any(&self) {
        self.signal.notified().await;
    }

    /// Wait until an outcome for `task_uid` is recorded, or until the
    /// timeout passes.
    ///
    /// Wakes from the shared signal re-check the cache and go back to
    /// sleep if the recorded outcome belongs to a different task. A
    /// final check after the deadline covers an outcome that raced the
    /// timeout.
    pub async fn wait_for(&self, task_uid: &str, timeout: Duration) -> Option<Arc<TaskOutcome>> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.signal.notified();
            tokio::pin!(notified);
            // Register interest before checking the cache so a record
            // landing between the check and the await still wakes us.
            notified.as_mut().enable();

            if let Some(outcome) = self.get(task_uid) {
                return Some(outcome);
            }

            let now = Instant::now();
            if now >= deadline {
                return self.get(task_uid);
            }

            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                // Deadline passed while parked.
                return self.get(task_uid);
            }
            // Woken by some completion. Loop and re-check our own uid.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(uid: &str, status: &str) -> TaskOutcome {
        TaskOutcome::from_remote(uid, status, json!({"status": status}), Duration::ZERO, 1)
    }

    #[test]
    fn first_write_wins() {
        let registry = TaskRegistry::new();
        let first = registry.record(outcome("t-1", "succeeded"));
        let second = registry.record(outcome("t-1", "failed"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.disposition, Disposition::Succeeded);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_is_idempotent() {
        let registry = TaskRegistry::new();
        registry.record(outcome("t-1", "failed"));

        let first = registry.get("t-1").unwrap();
        let second = registry.get("t-1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.disposition, Disposition::Failed);
        assert!(registry.get("t-2").is_none());
    }

    #[test]
    fn remote_disposition_follows_status() {
        assert_eq!(
            outcome("t", "SUCCEEDED").disposition,
            Disposition::Succeeded
        );
        assert_eq!(outcome("t", "failed").disposition, Disposition::Failed);
        assert_eq!(outcome("t", "aborted").disposition, Disposition::Failed);
    }

    #[test]
    fn failure_reason_prefers_payload_detail() {
        let explained = TaskOutcome::from_remote(
            "t-1",
            "failed",
            json!({"status": "failed", "error_detail": "no space left on container"}),
            Duration::ZERO,
            1,
        );
        assert_eq!(explained.failure_reason(), "no space left on container");

        let bare = outcome("t-2", "failed");
        assert_eq!(bare.failure_reason(), "task reported status 'failed'");
    }

    #[test]
    fn to_error_maps_each_disposition() {
        assert!(outcome("t", "succeeded").to_error().is_none());

        let failed = outcome("t", "failed").to_error().unwrap();
        assert!(matches!(failed, CoreError::TaskFailed { .. }));

        let timed = TaskOutcome::timed_out("t", Some("running".into()), Duration::from_secs(9), 3)
            .to_error()
            .unwrap();
        assert!(matches!(timed, CoreError::TaskTimeout { .. }));

        let aborted = TaskOutcome::aborted("t", None, Duration::ZERO, 0)
            .to_error()
            .unwrap();
        assert!(matches!(aborted, CoreError::TaskCancelled { .. }));

        let lost = TaskOutcome::unreachable("t", "connection refused", Duration::ZERO, 4)
            .to_error()
            .unwrap();
        assert!(matches!(lost, CoreError::TaskUnreachable { .. }));
        assert_eq!(lost.to_string(), "lost contact with task t: connection refused");
    }

    #[tokio::test]
    async fn wait_for_sees_already_recorded_outcome() {
        let registry = TaskRegistry::new();
        registry.record(outcome("t-1", "succeeded"));

        let hit = registry.wait_for("t-1", Duration::from_secs(5)).await;
        assert_eq!(hit.unwrap().disposition, Disposition::Succeeded);
    }

    #[tokio::test]
    async fn wait_for_times_out_when_nothing_recorded() {
        let registry = TaskRegistry::new();
        let miss = registry.wait_for("t-1", Duration::from_millis(50)).await;
        assert!(miss.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn waiter_is_not_fooled_by_another_tasks_completion() {
        let registry = Arc::new(TaskRegistry::new());

        let waiting = registry.clone();
        let waiter = tokio::spawn(async move {
            waiting.wait_for("task-a", Duration::from_secs(60)).await
        });

        // Give the waiter time to park, then complete a different task.
        tokio::time::sleep(Duration::from_millis(50)).await;
        registry.record(outcome("task-b", "succeeded"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(
            !waiter.is_finished(),
            "completion of task-b must not satisfy a waiter on task-a"
        );

        registry.record(outcome("task-a", "failed"));
        let got = waiter.await.unwrap().expect("waiter should see task-a");
        assert_eq!(got.task_uid, "task-a");
        assert_eq!(got.disposition, Disposition::Failed);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn record_wakes_concurrent_waiters() {
        let registry = Arc::new(TaskRegistry::new());

        let mut waiters = Vec::new();
        for _ in 0..4 {
            let shared = registry.clone();
            waiters.push(tokio::spawn(async move {
                shared.wait_for("t-1", Duration::from_secs(60)).await
            }));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        registry.record(outcome("t-1", "succeeded"));

        for waiter in waiters {
            let got = waiter.await.unwrap().expect("waiter should be woken");
            assert_eq!(got.task_uid, "t-1");
        }
    }
}
