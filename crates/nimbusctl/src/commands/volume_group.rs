//! Volume group commands

use nimbus_hci::{DiskSpec, VolumeGroupCreateRequest};
use nimbusctl_core::Session;
use nimbusctl_core::workflows::volume_group as vg_flows;

use crate::cli::{self, VolumeGroupCommands};
use crate::commands::async_utils::{
    WaitUi, announce_task, confirm_action, render_done, render_result,
};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub async fn handle_volume_group_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: VolumeGroupCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        VolumeGroupCommands::List { refresh } => {
            let groups = session.volume_groups(refresh).await?;
            print_output(&groups, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        VolumeGroupCommands::Get { volume_group } => {
            let uuid = session.resolve_volume_group(&volume_group).await?;
            let detail = session.client().volume_groups().get(&uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }

        VolumeGroupCommands::Create {
            name,
            description,
            disk_sizes_mb,
            async_ops,
        } => {
            let request = VolumeGroupCreateRequest {
                name: name.clone(),
                description,
                disks: disk_sizes_mb
                    .into_iter()
                    .map(|size_mb| DiskSpec {
                        size_mb: Some(size_mb),
                        ..Default::default()
                    })
                    .collect(),
            };

            if !async_ops.wait {
                let task = vg_flows::create_volume_group(&session, &request).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) =
                WaitUi::start(&session, &format!("Creating volume group '{name}'"));
            let result = vg_flows::create_volume_group_and_wait(
                &session,
                &request,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let group = result?;
            render_result(&group, &format!("Volume group '{name}' created"), output, query)
        }

        VolumeGroupCommands::Delete {
            volume_group,
            force,
            async_ops,
        } => {
            let uuid = session.resolve_volume_group(&volume_group).await?;
            if !force && !confirm_action(&format!("Delete volume group '{volume_group}'?"))? {
                return Ok(());
            }

            if !async_ops.wait {
                let task = vg_flows::delete_volume_group(&session, &uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) =
                WaitUi::start(&session, &format!("Deleting volume group '{volume_group}'"));
            let result = vg_flows::delete_volume_group_and_wait(
                &session,
                &uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_done(&format!("Volume group '{volume_group}' deleted"), output);
            Ok(())
        }

        VolumeGroupCommands::Attach {
            volume_group,
            vm,
            async_ops,
        } => {
            let vg_uuid = session.resolve_volume_group(&volume_group).await?;
            let vm_uuid = session.resolve_vm(&vm).await?;

            if !async_ops.wait {
                let task = vg_flows::attach_volume_group(&session, &vg_uuid, &vm_uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(
                &session,
                &format!("Attaching '{volume_group}' to vm '{vm}'"),
            );
            let result = vg_flows::attach_volume_group_and_wait(
                &session,
                &vg_uuid,
                &vm_uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_done(
                &format!("Volume group '{volume_group}' attached to vm '{vm}'"),
                output,
            );
            Ok(())
        }

        VolumeGroupCommands::Detach {
            volume_group,
            vm,
            async_ops,
        } => {
            let vg_uuid = session.resolve_volume_group(&volume_group).await?;
            let vm_uuid = session.resolve_vm(&vm).await?;

            if !async_ops.wait {
                let task = vg_flows::detach_volume_group(&session, &vg_uuid, &vm_uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(
                &session,
                &format!("Detaching '{volume_group}' from vm '{vm}'"),
            );
            let result = vg_flows::detach_volume_group_and_wait(
                &session,
                &vg_uuid,
                &vm_uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_done(
                &format!("Volume group '{volume_group}' detached from vm '{vm}'"),
                output,
            );
            Ok(())
        }
    }
}
