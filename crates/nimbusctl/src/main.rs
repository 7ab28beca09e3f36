//! nimbusctl - CLI for Nimbus HCI clusters
//!
//! Thin binary over nimbusctl-core: parses arguments, builds a client
//! from profile or environment credentials, dispatches to the command
//! handlers, and renders errors with suggestions.

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use clap::Parser;
use tracing::{debug, info, trace};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Cli, Commands};
use connection::ConnectionManager;
use error::CliError;
use nimbusctl_core::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    // Load configuration from specified path or default location
    let (config, config_path) = match load_config(cli.config_file.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    let conn_mgr = ConnectionManager::with_config_path(config, config_path);

    if let Err(e) = execute_command(cli, conn_mgr).await {
        e.print_diagnostic();
        std::process::exit(1);
    }
}

fn load_config(
    config_file: Option<&str>,
) -> Result<(Config, Option<std::path::PathBuf>), CliError> {
    if let Some(config_file) = config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        Ok((config, Some(path)))
    } else {
        debug!("Loading config from default location");
        Ok((Config::load()?, None))
    }
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "nimbusctl=warn,nimbusctl_core=warn,nimbus_hci=warn",
            1 => "nimbusctl=info,nimbusctl_core=info,nimbus_hci=info",
            2 => "nimbusctl=debug,nimbusctl_core=debug,nimbus_hci=debug",
            _ => "nimbusctl=trace,nimbusctl_core=trace,nimbus_hci=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(cli: Cli, mut conn_mgr: ConnectionManager) -> Result<(), CliError> {
    trace!("Executing command: {:?}", cli.command);
    info!("Command: {}", format_command(&cli.command));

    let profile = cli.profile.as_deref();
    let query = cli.query.as_deref();
    let start = std::time::Instant::now();

    let result = match cli.command {
        Commands::Vm(cmd) => {
            commands::vm::handle_vm_command(&conn_mgr, profile, cmd, cli.output, query).await
        }
        Commands::VolumeGroup(cmd) => {
            commands::volume_group::handle_volume_group_command(
                &conn_mgr, profile, cmd, cli.output, query,
            )
            .await
        }
        Commands::Image(cmd) => {
            commands::image::handle_image_command(&conn_mgr, profile, cmd, cli.output, query).await
        }
        Commands::Subnet(cmd) => {
            commands::subnet::handle_subnet_command(&conn_mgr, profile, cmd, cli.output, query)
                .await
        }
        Commands::Cluster(cmd) => {
            commands::cluster::handle_cluster_command(&conn_mgr, profile, cmd, cli.output, query)
                .await
        }
        Commands::Task(cmd) => {
            commands::task::handle_task_command(&conn_mgr, profile, cmd, cli.output, query).await
        }
        Commands::Profile(cmd) => {
            commands::profile::handle_profile_command(&mut conn_mgr, cmd, cli.output, query)
        }
        Commands::Api {
            method,
            path,
            data,
        } => {
            commands::api::handle_api_command(
                &conn_mgr, profile, method, path, data, cli.output, query,
            )
            .await
        }
        Commands::Version => {
            debug!("Showing version information");
            match cli.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });

                    let fmt = match cli.output {
                        cli::OutputFormat::Yaml => output::OutputFormat::Yaml,
                        _ => output::OutputFormat::Json,
                    };

                    output::print_output(&output_data, fmt, None)?;
                }
                _ => {
                    println!("nimbusctl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(shell);
            Ok(())
        }
    };

    match &result {
        Ok(()) => debug!("Command completed successfully in {:?}", start.elapsed()),
        Err(e) => debug!("Command failed after {:?}: {}", start.elapsed(), e),
    }

    result
}

fn generate_completions(shell: cli::Shell) {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    match shell {
        cli::Shell::Bash => {
            clap_complete::generate(clap_complete::shells::Bash, &mut cmd, name, &mut stdout)
        }
        cli::Shell::Zsh => {
            clap_complete::generate(clap_complete::shells::Zsh, &mut cmd, name, &mut stdout)
        }
        cli::Shell::Fish => {
            clap_complete::generate(clap_complete::shells::Fish, &mut cmd, name, &mut stdout)
        }
        cli::Shell::PowerShell => clap_complete::generate(
            clap_complete::shells::PowerShell,
            &mut cmd,
            name,
            &mut stdout,
        ),
        cli::Shell::Elvish => {
            clap_complete::generate(clap_complete::shells::Elvish, &mut cmd, name, &mut stdout)
        }
    }
}

/// Render a command for logging with credentials redacted.
fn format_command(command: &Commands) -> String {
    match command {
        Commands::Vm(cmd) => format!("vm {:?}", cmd),
        Commands::VolumeGroup(cmd) => format!("volume-group {:?}", cmd),
        Commands::Image(cmd) => format!("image {:?}", cmd),
        Commands::Subnet(cmd) => format!("subnet {:?}", cmd),
        Commands::Cluster(cmd) => format!("cluster {:?}", cmd),
        Commands::Task(cmd) => format!("task {:?}", cmd),
        Commands::Profile(cmd) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, .. } => format!("profile set {} [credentials redacted]", name),
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Commands::Api { method, path, .. } => format!("api {} {}", method, path),
        Commands::Version => "version".to_string(),
        Commands::Completions { shell } => format!("completions {:?}", shell),
    }
}
