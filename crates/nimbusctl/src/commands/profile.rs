//! Profile management commands

use nimbusctl_core::{Config, Profile};
use serde_json::json;

use crate::cli::{self, ProfileCommands};
use crate::connection::ConnectionManager;
use crate::error::{CliError, Result as CliResult};
use crate::output::{OutputFormat, print_output};

pub fn handle_profile_command(
    conn: &mut ConnectionManager,
    command: ProfileCommands,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match command {
        ProfileCommands::List => {
            let default = conn.config.default_profile.clone();
            let rows: Vec<_> = conn
                .config
                .list_profiles()
                .into_iter()
                .map(|(name, profile)| {
                    json!({
                        "name": name,
                        "endpoint": profile.endpoint,
                        "username": profile.username,
                        "dialect": profile.dialect.to_string(),
                        "cluster_uuid": profile.cluster_uuid,
                        "default": default.as_deref() == Some(name.as_str()),
                    })
                })
                .collect();

            if rows.is_empty()
                && matches!(output, cli::OutputFormat::Auto | cli::OutputFormat::Table)
            {
                println!("No profiles configured. Create one with 'nimbusctl profile set'.");
                return Ok(());
            }
            print_output(&rows, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        ProfileCommands::Path => {
            let path = match &conn.config_path {
                Some(path) => path.clone(),
                None => Config::config_path()?,
            };
            println!("{}", path.display());
            Ok(())
        }

        ProfileCommands::Show { name } => {
            let profile = conn
                .config
                .profile(&name)
                .ok_or_else(|| CliError::ProfileNotFound { name: name.clone() })?;

            let detail = json!({
                "name": name,
                "endpoint": profile.endpoint,
                "username": profile.username,
                "password": profile.password.as_ref().map(|_| "********"),
                "dialect": profile.dialect.to_string(),
                "cluster_uuid": profile.cluster_uuid,
                "insecure": profile.insecure,
                "ca_cert": profile.ca_cert,
            });
            print_output(&detail, OutputFormat::resolve(output, OutputFormat::Table), query)?;
            Ok(())
        }

        ProfileCommands::Set {
            name,
            endpoint,
            username,
            password,
            dialect,
            cluster_uuid,
            insecure,
            ca_cert,
        } => {
            let profile = Profile {
                endpoint,
                username,
                password,
                dialect,
                cluster_uuid,
                insecure,
                ca_cert,
            };
            // Surface a bad dialect/cluster combination now rather than
            // at first connection.
            profile.dialect(&name)?;

            conn.config.set_profile(name.clone(), profile);
            conn.save_config()?;
            println!("Profile '{}' saved", name);
            Ok(())
        }

        ProfileCommands::Remove { name } => {
            if !conn.config.remove_profile(&name) {
                return Err(CliError::ProfileNotFound { name });
            }
            conn.save_config()?;
            println!("Profile '{}' removed", name);
            Ok(())
        }

        ProfileCommands::Default { name } => {
            if conn.config.profile(&name).is_none() {
                return Err(CliError::ProfileNotFound { name });
            }
            conn.config.default_profile = Some(name.clone());
            conn.save_config()?;
            println!("Default profile set to '{}'", name);
            Ok(())
        }
    }
}
