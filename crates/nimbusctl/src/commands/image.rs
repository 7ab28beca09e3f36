//! Image catalog commands

use nimbus_hci::ImageCreateRequest;
use nimbusctl_core::Session;
use nimbusctl_core::workflows::image as image_flows;

use crate::cli::{self, ImageCommands};
use crate::commands::async_utils::{
    WaitUi, announce_task, confirm_action, render_done, render_result,
};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub async fn handle_image_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: ImageCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        ImageCommands::List { refresh } => {
            let images = session.images(refresh).await?;
            print_output(&images, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        ImageCommands::Get { image } => {
            let uuid = session.resolve_image(&image).await?;
            let detail = session.client().images().get(&uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }

        ImageCommands::Create {
            name,
            source_uri,
            image_type,
            annotation,
            async_ops,
        } => {
            let request = ImageCreateRequest {
                name: name.clone(),
                annotation,
                image_type,
                source_uri,
            };

            if !async_ops.wait {
                let task = image_flows::create_image(&session, &request).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Creating image '{name}'"));
            let result = image_flows::create_image_and_wait(
                &session,
                &request,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let image = result?;
            render_result(&image, &format!("Image '{name}' created"), output, query)
        }

        ImageCommands::Upload {
            image,
            file,
            async_ops,
        } => {
            let uuid = session.resolve_image(&image).await?;
            let content = std::fs::read(&file).map_err(|e| CliError::FileError {
                path: file.display().to_string(),
                message: e.to_string(),
            })?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image.bin")
                .to_string();

            if !async_ops.wait {
                let task = image_flows::upload_image(&session, &uuid, &file_name, content).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) =
                WaitUi::start(&session, &format!("Uploading '{file_name}' to '{image}'"));
            let result = image_flows::upload_image_and_wait(
                &session,
                &uuid,
                &file_name,
                content,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            let detail = result?;
            render_result(
                &detail,
                &format!("Uploaded '{file_name}' to image '{image}'"),
                output,
                query,
            )
        }

        ImageCommands::Delete {
            image,
            force,
            async_ops,
        } => {
            let uuid = session.resolve_image(&image).await?;
            if !force && !confirm_action(&format!("Delete image '{image}'?"))? {
                return Ok(());
            }

            if !async_ops.wait {
                let task = image_flows::delete_image(&session, &uuid).await?;
                return announce_task(&task, output, query);
            }

            let (ui, callback) = WaitUi::start(&session, &format!("Deleting image '{image}'"));
            let result = image_flows::delete_image_and_wait(
                &session,
                &uuid,
                &async_ops.watch_options(),
                Some(callback),
            )
            .await;
            ui.done();
            result?;
            render_done(&format!("Image '{image}' deleted"), output);
            Ok(())
        }
    }
}
