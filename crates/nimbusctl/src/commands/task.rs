//! Task inspection and waiting commands

use std::time::Duration;

use nimbusctl_core::{Session, TaskOutcome, WatchOptions};

use crate::cli::{self, TaskCommands};
use crate::commands::async_utils::{WaitUi, cancel_on_ctrl_c};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub async fn handle_task_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: TaskCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        TaskCommands::Get { task_uuid } => {
            let detail = session.client().tasks().get(&task_uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }

        TaskCommands::Watch {
            task_uuids,
            wait_timeout,
            poll_ceiling,
        } => {
            let options = WatchOptions::default()
                .with_interval_ceiling(Duration::from_secs(poll_ceiling))
                .with_timeout(Some(Duration::from_secs(wait_timeout)));

            let outcomes = if let [task_uuid] = task_uuids.as_slice() {
                // Single task: drive a spinner off the progress events.
                let (ui, callback) =
                    WaitUi::start(&session, &format!("Waiting for task {task_uuid}"));
                let outcome = session
                    .await_task(task_uuid.clone(), options, Some(callback))
                    .await;
                ui.done();
                vec![outcome]
            } else {
                // Several tasks share the registry and complete in any
                // order; collect every outcome before reporting.
                cancel_on_ctrl_c(&session);
                let handles: Vec<_> = task_uuids
                    .iter()
                    .map(|uuid| session.watch_task(uuid.clone(), options.clone(), None))
                    .collect();
                futures::future::join_all(handles.into_iter().map(|handle| handle.join())).await
            };

            let report: Vec<&TaskOutcome> = outcomes.iter().map(|o| o.as_ref()).collect();
            print_output(
                &report,
                OutputFormat::resolve(output, OutputFormat::Table),
                query,
            )?;

            // Any non-success disposition makes the command fail after
            // all outcomes have been printed.
            if let Some(err) = outcomes.iter().find_map(|o| o.to_error()) {
                return Err(err.into());
            }
            Ok(())
        }
    }
}
