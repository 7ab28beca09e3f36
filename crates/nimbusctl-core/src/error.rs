//! Error types shared by the orchestration layer.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias for orchestration operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while driving long-running operations against a cluster.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The REST layer returned an error before any task was created.
    #[error(transparent)]
    Api(#[from] nimbus_hci::RestError),

    /// The cluster reported the task as failed.
    #[error("task {task_uid} failed: {reason}")]
    TaskFailed { task_uid: String, reason: String },

    /// Polling gave up before the task reached a terminal status.
    #[error("task {task_uid} did not complete within {elapsed:?}")]
    TaskTimeout { task_uid: String, elapsed: Duration },

    /// The watcher was cancelled before the task finished.
    #[error("watch of task {task_uid} was cancelled")]
    TaskCancelled { task_uid: String },

    /// Repeated status fetches failed, so the final state is unknown.
    #[error("lost contact with task {task_uid}: {reason}")]
    TaskUnreachable { task_uid: String, reason: String },

    /// A multi-step provisioning workflow failed partway through.
    ///
    /// `rollback` reports whether the compensating cleanup ran cleanly,
    /// so callers can distinguish "nothing left behind" from "manual
    /// cleanup required".
    #[error("provisioning {resource} failed: {cause} ({rollback})")]
    Provision {
        resource: String,
        #[source]
        cause: Box<CoreError>,
        rollback: RollbackOutcome,
    },

    /// Input that could be rejected before talking to the cluster.
    #[error("{0}")]
    Validation(String),

    /// Profile or config file problems.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Check if this is a "not found" error from the REST layer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Api(e) if e.is_not_found())
    }

    /// Check if this is an authentication or permission error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Api(e) if e.is_unauthorized())
    }

    /// Check if the operation ran out of time, either at the transport
    /// or while polling a task.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_timeout(),
            CoreError::TaskTimeout { .. } => true,
            _ => false,
        }
    }

    /// Check if this error describes a task that started but did not
    /// reach success (as opposed to a request that never produced one).
    #[must_use]
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            CoreError::TaskFailed { .. }
                | CoreError::TaskTimeout { .. }
                | CoreError::TaskCancelled { .. }
                | CoreError::TaskUnreachable { .. }
                | CoreError::Provision { .. }
        )
    }

    /// Check if retrying the whole operation could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Api(e) => e.is_retryable(),
            CoreError::TaskTimeout { .. } | CoreError::TaskUnreachable { .. } => true,
            _ => false,
        }
    }

    /// The task uid this error is about, when there is one.
    #[must_use]
    pub fn task_uid(&self) -> Option<&str> {
        match self {
            CoreError::TaskFailed { task_uid, .. }
            | CoreError::TaskTimeout { task_uid, .. }
            | CoreError::TaskCancelled { task_uid }
            | CoreError::TaskUnreachable { task_uid, .. } => Some(task_uid),
            CoreError::Provision { cause, .. } => cause.task_uid(),
            _ => None,
        }
    }
}

/// What happened to the compensating cleanup after a workflow failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The partially created resource was removed.
    Completed,
    /// Cleanup itself failed; the resource may still exist.
    Failed { reason: String },
}

impl RollbackOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, RollbackOutcome::Completed)
    }
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackOutcome::Completed => write!(f, "rolled back"),
            RollbackOutcome::Failed { reason } => {
                write!(f, "rollback failed, manual cleanup may be needed: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failed_formats_reason() {
        let err = CoreError::TaskFailed {
            task_uid: "t-1".into(),
            reason: "disk quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "task t-1 failed: disk quota exceeded");
        assert!(err.is_task_failure());
        assert!(!err.is_retryable());
        assert_eq!(err.task_uid(), Some("t-1"));
    }

    #[test]
    fn timeout_variants_are_timeouts() {
        let err = CoreError::TaskTimeout {
            task_uid: "t-2".into(),
            elapsed: Duration::from_secs(600),
        };
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[test]
    fn unreachable_is_retryable_but_cancelled_is_not() {
        let lost = CoreError::TaskUnreachable {
            task_uid: "t-3".into(),
            reason: "connection refused".into(),
        };
        assert!(lost.is_retryable());

        let cancelled = CoreError::TaskCancelled {
            task_uid: "t-3".into(),
        };
        assert!(!cancelled.is_retryable());
        assert!(cancelled.is_task_failure());
    }

    #[test]
    fn provision_reports_rollback_state() {
        let err = CoreError::Provision {
            resource: "vm 'web-01'".into(),
            cause: Box::new(CoreError::TaskFailed {
                task_uid: "t-4".into(),
                reason: "no host with enough memory".into(),
            }),
            rollback: RollbackOutcome::Completed,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("provisioning vm 'web-01' failed"));
        assert!(rendered.contains("(rolled back)"));
        assert_eq!(err.task_uid(), Some("t-4"));

        let dirty = CoreError::Provision {
            resource: "vm 'web-01'".into(),
            cause: Box::new(CoreError::TaskCancelled {
                task_uid: "t-5".into(),
            }),
            rollback: RollbackOutcome::Failed {
                reason: "delete returned 500".into(),
            },
        };
        assert!(dirty.to_string().contains("manual cleanup may be needed"));
        assert!(!matches!(
            dirty,
            CoreError::Provision { ref rollback, .. } if rollback.is_clean()
        ));
    }

    #[test]
    fn api_errors_delegate_predicates() {
        let err = CoreError::Api(nimbus_hci::RestError::NotFound {
            path: "/v2/vms/x".into(),
        });
        assert!(err.is_not_found());
        assert!(!err.is_task_failure());
    }
}
