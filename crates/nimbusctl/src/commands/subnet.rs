//! Subnet commands

use nimbus_hci::SubnetCreateRequest;
use nimbusctl_core::Session;
use nimbusctl_core::workflows::subnet as subnet_flows;

use crate::cli::{self, SubnetCommands};
use crate::commands::async_utils::{
    WaitUi, announce_task, confirm_action, render_done, render_result,
};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub async fn handle_subnet_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: SubnetCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        SubnetCommands::List { refresh } => {
            let subnets = session.subnets(refresh).await?;
            print_output(&subnets, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        SubnetCommands::Get { subnet } => {
            let uuid = session.resolve_subnet(&subnet).await?;
            let detail = session.client().subnets().get(&uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }

        SubnetCommands::Create {
            name,
            vlan_id,
            network_address,
            prefix_length,
            async_ops,
        } => {
            let request = SubnetCreateRequest {
                name: name.clone(),
                vlan_id,
                network_address,
                prefix_length,
            };

            if !async_ops.wait {
                let task = subnet_flows::create_subnet(&session, &request).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Creating subnet '{name}'"));
            let result = subnet_flows::create_subnet_and_wait(
                &session,
                &request,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let subnet = result?;
            render_result(&subnet, &format!("Subnet '{name}' created"), output, query)
        }

        SubnetCommands::Delete {
            subnet,
            force,
            async_ops,
        } => {
            let uuid = session.resolve_subnet(&subnet).await?;
            if !force && !confirm_action(&format!("Delete subnet '{subnet}'?"))? {
                return Ok(());
            }

            if !async_ops.wait {
                let task = subnet_flows::delete_subnet(&session, &uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Deleting subnet '{subnet}'"));
            let result = subnet_flows::delete_subnet_and_wait(
                &session,
                &uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_done(&format!("Subnet '{subnet}' deleted"), output);
            Ok(())
        }
    }
}
