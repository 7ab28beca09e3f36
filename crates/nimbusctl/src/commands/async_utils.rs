//! Shared utilities for commands that submit tasks: --wait handling,
//! spinner progress, confirmation prompts.

use std::time::Duration;

use anyhow::Context;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use nimbus_hci::TaskRef;
use nimbusctl_core::{ProgressCallback, ProgressEvent, Session, WatchOptions};
use serde_json::Value;
use tracing::warn;

use crate::cli::{self, AsyncOperationArgs};
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

impl AsyncOperationArgs {
    /// Watch options derived from the --wait-timeout / --poll-ceiling flags.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions::default()
            .with_interval_ceiling(Duration::from_secs(self.poll_ceiling))
            .with_timeout(Some(Duration::from_secs(self.wait_timeout)))
    }
}

/// Cancel the session's in-flight watches when the user hits ctrl-c, so
/// their outcomes are recorded as aborted instead of vanishing.
pub fn cancel_on_ctrl_c(session: &Session) {
    let cancel = session.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight watches");
            cancel.cancel();
        }
    });
}

/// Spinner shown while waiting on a task, plus the progress callback
/// that drives it. The callback finishes the spinner on terminal events.
pub struct WaitUi {
    pb: ProgressBar,
}

impl WaitUi {
    pub fn start(session: &Session, message: &str) -> (Self, ProgressCallback) {
        cancel_on_ctrl_c(session);

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message.to_string());

        let callback = spinner_callback(pb.clone());
        (Self { pb }, callback)
    }

    /// Clear the spinner if no terminal event did it already, e.g. when
    /// the request failed before a watch ever started.
    pub fn done(self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

fn spinner_callback(pb: ProgressBar) -> ProgressCallback {
    Box::new(move |event: ProgressEvent| match event {
        ProgressEvent::Started { task_uid } => {
            pb.set_message(format!("Task {} started", task_uid));
        }
        ProgressEvent::Polling {
            task_uid, status, ..
        } => {
            pb.set_message(format!("Task {}: {}", task_uid, status));
        }
        ProgressEvent::Completed { task_uid } => {
            pb.finish_with_message(format!("Task {}: \u{2713} completed", task_uid));
        }
        ProgressEvent::Failed { task_uid, reason } => {
            pb.finish_with_message(format!("Task {}: \u{2717} {}", task_uid, reason));
        }
    })
}

/// Report a freshly submitted task without waiting on it.
pub fn announce_task(
    task: &TaskRef,
    format: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match format {
        cli::OutputFormat::Auto | cli::OutputFormat::Table => {
            println!("Task {} started", task.task_uuid);
            println!(
                "To wait for completion, run: nimbusctl task watch {}",
                task.task_uuid
            );
            Ok(())
        }
        _ => {
            print_output(task, OutputFormat::resolve(format, OutputFormat::Json), query)?;
            Ok(())
        }
    }
}

/// Render the result of a completed workflow: a success line for humans,
/// the resource payload for scripts.
pub fn render_result(
    value: &Value,
    message: &str,
    format: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match format {
        cli::OutputFormat::Auto | cli::OutputFormat::Table => {
            println!("{}", message);
            Ok(())
        }
        _ => {
            print_output(value, OutputFormat::resolve(format, OutputFormat::Json), query)?;
            Ok(())
        }
    }
}

/// Print a success line for workflows that return no payload.
pub fn render_done(message: &str, format: cli::OutputFormat) {
    if matches!(
        format,
        cli::OutputFormat::Auto | cli::OutputFormat::Table
    ) {
        println!("{}", message);
    }
}

/// Confirm a destructive action with the user.
///
/// Refuses in non-interactive sessions so scripts cannot hang on a
/// prompt; they must pass --force instead.
pub fn confirm_action(message: &str) -> CliResult<bool> {
    use std::io::IsTerminal;

    if std::io::stdin().is_terminal() {
        Ok(Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to get user confirmation")?)
    } else {
        eprintln!("Warning: {} Use --force to skip confirmation.", message);
        Ok(false)
    }
}
