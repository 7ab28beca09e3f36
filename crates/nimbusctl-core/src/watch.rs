//! Task polling.
//!
//! [`watch`] drives one task to completion: sleep a jittered interval,
//! fetch the task, classify its status through the client's dialect,
//! repeat. It is written to be spawned and forgotten, so it never
//! returns an error; whatever happens (terminal status, poll budget
//! exhausted, cancellation, cluster unreachable) it records exactly one
//! outcome in the [`TaskRegistry`] and releases the completion signal
//! on the way out.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use nimbus_hci::HciClient;

use crate::progress::{ProgressCallback, ProgressEvent, emit};
use crate::registry::{Disposition, TaskOutcome, TaskRegistry};

/// Default ceiling for the random sleep between polls.
pub const DEFAULT_INTERVAL_CEILING: Duration = Duration::from_secs(60);

/// Default overall polling budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default number of consecutive fetch failures tolerated before the
/// task is declared unreachable.
pub const DEFAULT_FETCH_RETRY_LIMIT: u32 = 3;

/// Tuning knobs for a single watch.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Each sleep between polls is drawn uniformly at random from zero
    /// to this ceiling, so many concurrent watchers spread their
    /// requests instead of polling in lockstep.
    pub interval_ceiling: Duration,
    /// Overall budget; when it runs out the watch records a timed-out
    /// outcome. `None` polls forever (until cancelled).
    pub timeout: Option<Duration>,
    /// Consecutive fetch failures tolerated before giving up with an
    /// unreachable outcome. A successful fetch resets the count.
    pub fetch_retry_limit: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval_ceiling: DEFAULT_INTERVAL_CEILING,
            timeout: Some(DEFAULT_TIMEOUT),
            fetch_retry_limit: DEFAULT_FETCH_RETRY_LIMIT,
        }
    }
}

impl WatchOptions {
    /// Options with a given interval ceiling, keeping the defaults for
    /// everything else.
    #[must_use]
    pub fn with_interval_ceiling(mut self, ceiling: Duration) -> Self {
        self.interval_ceiling = ceiling;
        self
    }

    /// Options with a given overall budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

fn jittered(ceiling: Duration, rng: &mut impl Rng) -> Duration {
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    rng.random_range(Duration::ZERO..=ceiling)
}

/// Poll `task_uid` until it reaches a terminal state, the budget runs
/// out, the token is cancelled, or the cluster stops answering.
///
/// Always records exactly one outcome in `registry` before returning,
/// and returns the canonical stored outcome (which is the earlier one
/// if some other watcher got there first).
pub async fn watch(
    client: HciClient,
    registry: Arc<TaskRegistry>,
    task_uid: String,
    options: WatchOptions,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
) -> Arc<TaskOutcome> {
    let started = Instant::now();
    let deadline = options.timeout.map(|t| started + t);
    let retry_limit = options.fetch_retry_limit.max(1);

    let mut polls: u32 = 0;
    let mut consecutive_failures: u32 = 0;
    let mut last_status: Option<String> = None;

    debug!(task_uid = %task_uid, dialect = %client.dialect(), "watching task");
    emit(
        &on_progress,
        ProgressEvent::Started {
            task_uid: task_uid.clone(),
        },
    );

    loop {
        let mut delay = jittered(options.interval_ceiling, &mut rand::rng());
        if let Some(deadline) = deadline {
            delay = delay.min(deadline.saturating_duration_since(Instant::now()));
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let outcome =
                    TaskOutcome::aborted(&task_uid, last_status, started.elapsed(), polls);
                return seal(&registry, &on_progress, outcome);
            }
            () = tokio::time::sleep(delay) => {}
        }

        polls += 1;
        let failure = match client.tasks().get(&task_uid).await {
            Ok(body) => {
                let status = client
                    .dialect()
                    .status_of(&body)
                    .map(ToOwned::to_owned);
                match status {
                    Some(status) if client.dialect().is_in_progress(&status) => {
                        consecutive_failures = 0;
                        debug!(
                            task_uid = %task_uid,
                            status = %status,
                            polls,
                            "task still in progress"
                        );
                        emit(
                            &on_progress,
                            ProgressEvent::Polling {
                                task_uid: task_uid.clone(),
                                status: status.clone(),
                                elapsed: started.elapsed(),
                            },
                        );
                        last_status = Some(status);
                        None
                    }
                    Some(status) => {
                        let outcome = TaskOutcome::from_remote(
                            &task_uid,
                            status,
                            body,
                            started.elapsed(),
                            polls,
                        );
                        return seal(&registry, &on_progress, outcome);
                    }
                    None => Some(format!(
                        "task response missing '{}' field",
                        client.dialect().status_field()
                    )),
                }
            }
            Err(err) => Some(err.to_string()),
        };

        if let Some(reason) = failure {
            consecutive_failures += 1;
            warn!(
                task_uid = %task_uid,
                consecutive_failures,
                %reason,
                "task status fetch failed"
            );
            if consecutive_failures >= retry_limit {
                let outcome =
                    TaskOutcome::unreachable(&task_uid, reason, started.elapsed(), polls);
                return seal(&registry, &on_progress, outcome);
            }
        }

        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            let outcome = TaskOutcome::timed_out(&task_uid, last_status, started.elapsed(), polls);
            return seal(&registry, &on_progress, outcome);
        }
    }
}

fn seal(
    registry: &TaskRegistry,
    on_progress: &Option<ProgressCallback>,
    outcome: TaskOutcome,
) -> Arc<TaskOutcome> {
    match outcome.disposition {
        Disposition::Succeeded => {
            info!(
                task_uid = %outcome.task_uid,
                polls = outcome.polls,
                elapsed = ?outcome.elapsed,
                "task succeeded"
            );
            emit(
                on_progress,
                ProgressEvent::Completed {
                    task_uid: outcome.task_uid.clone(),
                },
            );
        }
        disposition => {
            warn!(
                task_uid = %outcome.task_uid,
                %disposition,
                polls = outcome.polls,
                elapsed = ?outcome.elapsed,
                "task did not succeed"
            );
            emit(
                on_progress,
                ProgressEvent::Failed {
                    task_uid: outcome.task_uid.clone(),
                    reason: outcome.failure_reason(),
                },
            );
        }
    }
    registry.record(outcome)
}

/// Handle to a watch running in its own tokio task.
#[derive(Debug)]
pub struct WatchHandle {
    task_uid: String,
    registry: Arc<TaskRegistry>,
    cancel: CancellationToken,
    join: JoinHandle<Arc<TaskOutcome>>,
}

impl WatchHandle {
    /// Uid of the task being watched.
    #[must_use]
    pub fn task_uid(&self) -> &str {
        &self.task_uid
    }

    /// Ask the watcher to stop. It will record an aborted outcome and
    /// release the completion signal before it exits.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the watcher to finish and return its recorded outcome.
    pub async fn join(self) -> Arc<TaskOutcome> {
        match self.join.await {
            Ok(outcome) => outcome,
            // The watcher can only fail to report if its runtime died
            // under it. Check the registry, then synthesize.
            Err(err) => self.registry.get(&self.task_uid).unwrap_or_else(|| {
                Arc::new(TaskOutcome::unreachable(
                    &self.task_uid,
                    format!("watcher task aborted: {err}"),
                    Duration::ZERO,
                    0,
                ))
            }),
        }
    }
}

/// Spawn [`watch`] on the current runtime and return a handle that can
/// cancel it or await its outcome.
pub fn spawn_watch(
    client: HciClient,
    registry: Arc<TaskRegistry>,
    task_uid: impl Into<String>,
    options: WatchOptions,
    on_progress: Option<ProgressCallback>,
) -> WatchHandle {
    spawn_watch_linked(
        client,
        registry,
        task_uid,
        options,
        &CancellationToken::new(),
        on_progress,
    )
}

/// Like [`spawn_watch`], but the watch's token is a child of `parent`,
/// so cancelling the parent stops this watch too. The handle's
/// [`WatchHandle::cancel`] still stops only this watch.
pub fn spawn_watch_linked(
    client: HciClient,
    registry: Arc<TaskRegistry>,
    task_uid: impl Into<String>,
    options: WatchOptions,
    parent: &CancellationToken,
    on_progress: Option<ProgressCallback>,
) -> WatchHandle {
    let task_uid = task_uid.into();
    let cancel = parent.child_token();
    let join = tokio::spawn(watch(
        client,
        registry.clone(),
        task_uid.clone(),
        options,
        cancel.clone(),
        on_progress,
    ));
    WatchHandle {
        task_uid,
        registry,
        cancel,
        join,
    }
}
