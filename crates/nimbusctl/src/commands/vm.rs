//! Virtual machine commands

use nimbus_hci::{DiskSpec, NicSpec, PowerTransition, VmCloneRequest, VmCreateRequest};
use nimbusctl_core::Session;
use nimbusctl_core::workflows::vm as vm_flows;

use crate::cli::{self, PowerAction, VmCommands};
use crate::commands::async_utils::{WaitUi, announce_task, confirm_action, render_result};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub async fn handle_vm_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: VmCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        VmCommands::List { refresh } => {
            let vms = session.vms(refresh).await?;
            print_output(&vms, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        VmCommands::Get { vm } => {
            let uuid = session.resolve_vm(&vm).await?;
            let detail = session.client().vms().get(&uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }

        VmCommands::Create {
            name,
            vcpus,
            memory_mb,
            description,
            image,
            disk_size_mb,
            subnet,
            ip,
            volume_groups,
            power_on,
            async_ops,
        } => {
            let mut disks = Vec::new();
            if let Some(image) = image {
                let image_uuid = session.resolve_image(&image).await?;
                disks.push(DiskSpec {
                    image_uuid: Some(image_uuid),
                    ..Default::default()
                });
            }
            if let Some(size_mb) = disk_size_mb {
                disks.push(DiskSpec {
                    size_mb: Some(size_mb),
                    ..Default::default()
                });
            }

            let mut nics = Vec::new();
            if let Some(subnet) = subnet {
                let subnet_uuid = session.resolve_subnet(&subnet).await?;
                nics.push(NicSpec {
                    subnet_uuid,
                    ip_address: ip,
                });
            }

            let request = VmCreateRequest {
                name: name.clone(),
                num_vcpus: vcpus,
                memory_mb,
                description,
                disks,
                nics,
            };

            if !async_ops.wait {
                if !volume_groups.is_empty() || power_on {
                    return Err(CliError::InvalidInput {
                        message: "--volume-group and --power-on require --wait".to_string(),
                    });
                }
                let task = vm_flows::create_vm(&session, &request).await?;
                return announce_task(&task, output, query);
            }

            let mut vg_uuids = Vec::with_capacity(volume_groups.len());
            for vg in &volume_groups {
                vg_uuids.push(session.resolve_volume_group(vg).await?);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Creating vm '{name}'"));
            let result = vm_flows::provision_vm_and_wait(
                &session,
                &request,
                &vg_uuids,
                power_on,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let vm = result?;
            render_result(&vm, &format!("VM '{name}' created"), output, query)
        }

        VmCommands::Delete {
            vm,
            force,
            async_ops,
        } => {
            let uuid = session.resolve_vm(&vm).await?;
            if !force && !confirm_action(&format!("Delete vm '{vm}'?"))? {
                return Ok(());
            }

            if !async_ops.wait {
                let task = vm_flows::delete_vm(&session, &uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Deleting vm '{vm}'"));
            let result = vm_flows::delete_vm_and_wait(
                &session,
                &uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_result(&serde_json::json!({"deleted": uuid}), &format!("VM '{vm}' deleted"), output, query)
        }

        VmCommands::Clone {
            source,
            name,
            async_ops,
        } => {
            let source_uuid = session.resolve_vm(&source).await?;
            let request = VmCloneRequest { name: name.clone() };

            if !async_ops.wait {
                let task = vm_flows::clone_vm(&session, &source_uuid, &request).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) =
                WaitUi::start(&session, &format!("Cloning '{source}' into '{name}'"));
            let result = vm_flows::clone_vm_and_wait(
                &session,
                &source_uuid,
                &request,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let clone = result?;
            render_result(&clone, &format!("VM '{name}' cloned from '{source}'"), output, query)
        }

        VmCommands::Power {
            vm,
            state,
            async_ops,
        } => {
            let uuid = session.resolve_vm(&vm).await?;
            let transition = match state {
                PowerAction::On => PowerTransition::On,
                PowerAction::Off => PowerTransition::Off,
            };

            if !async_ops.wait {
                let task = vm_flows::set_power_state(&session, &uuid, transition).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Powering {state} vm '{vm}'"));
            let result = vm_flows::set_power_state_and_wait(
                &session,
                &uuid,
                transition,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let detail = result?;
            render_result(&detail, &format!("VM '{vm}' powered {state}"), output, query)
        }

        VmCommands::AttachDisk {
            vm,
            size_mb,
            image,
            storage_container,
            async_ops,
        } => {
            let uuid = session.resolve_vm(&vm).await?;
            let image_uuid = match image {
                Some(image) => Some(session.resolve_image(&image).await?),
                None => None,
            };
            let disk = DiskSpec {
                size_mb,
                image_uuid,
                storage_container,
            };

            if !async_ops.wait {
                let task = vm_flows::attach_disk(&session, &uuid, &disk).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) =
                WaitUi::start(&session, &format!("Attaching disk to vm '{vm}'"));
            let result = vm_flows::attach_disk_and_wait(
                &session,
                &uuid,
                &disk,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let detail = result?;
            render_result(&detail, &format!("Disk attached to vm '{vm}'"), output, query)
        }

        VmCommands::AttachNic {
            vm,
            subnet,
            ip,
            async_ops,
        } => {
            let uuid = session.resolve_vm(&vm).await?;
            let subnet_uuid = session.resolve_subnet(&subnet).await?;
            let nic = NicSpec {
                subnet_uuid,
                ip_address: ip,
            };

            if !async_ops.wait {
                let task = vm_flows::attach_nic(&session, &uuid, &nic).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Attaching nic to vm '{vm}'"));
            let result = vm_flows::attach_nic_and_wait(
                &session,
                &uuid,
                &nic,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let detail = result?;
            render_result(&detail, &format!("NIC attached to vm '{vm}'"), output, query)
        }
    }
}
