//! Cluster information commands

use nimbusctl_core::Session;

use crate::cli::{self, ClusterCommands};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub async fn handle_cluster_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    command: ClusterCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let session = Session::new(conn.create_client(profile)?);

    match command {
        ClusterCommands::List { refresh } => {
            let clusters = session.clusters(refresh).await?;
            print_output(
                &clusters,
                OutputFormat::resolve(output, OutputFormat::Table),
                query,
            )?;
            Ok(())
        }

        ClusterCommands::Get { uuid } => {
            let detail = session.client().clusters().get(&uuid).await?;
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Json), query)?;
            Ok(())
        }
    }
}
