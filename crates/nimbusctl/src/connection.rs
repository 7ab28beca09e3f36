//! Connection management for Nimbus HCI clients

use crate::error::{CliError, Result as CliResult};
use anyhow::Context;
use nimbus_hci::{Dialect, HciClient};
use nimbusctl_core::{Config, DialectKind};
use tracing::{debug, info, trace};

/// User agent string for nimbusctl HTTP requests
const NIMBUSCTL_USER_AGENT: &str = concat!("nimbusctl/", env!("CARGO_PKG_VERSION"));

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Create an HCI client from profile credentials with environment
    /// variable override support.
    ///
    /// When --config-file is explicitly specified, environment variables
    /// are ignored to provide true configuration isolation ("explicit
    /// wins": CLI args > env vars > defaults).
    pub fn create_client(&self, profile_name: Option<&str>) -> CliResult<HciClient> {
        debug!("Creating Nimbus HCI client");
        trace!("Profile name: {:?}", profile_name);

        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env_endpoint = if use_env_vars {
            std::env::var("NIMBUS_ENDPOINT").ok()
        } else {
            None
        };
        let env_username = if use_env_vars {
            std::env::var("NIMBUS_USERNAME").ok()
        } else {
            None
        };
        let env_password = if use_env_vars {
            std::env::var("NIMBUS_PASSWORD").ok()
        } else {
            None
        };
        let env_dialect = if use_env_vars {
            std::env::var("NIMBUS_DIALECT").ok()
        } else {
            None
        };
        let env_cluster = if use_env_vars {
            std::env::var("NIMBUS_CLUSTER_UUID").ok()
        } else {
            None
        };
        let env_insecure = if use_env_vars {
            std::env::var("NIMBUS_INSECURE").ok()
        } else {
            None
        };
        let env_ca_cert = if use_env_vars {
            std::env::var("NIMBUS_CA_CERT").ok()
        } else {
            None
        };

        if env_endpoint.is_some() {
            debug!("Found NIMBUS_ENDPOINT environment variable");
        }
        if env_username.is_some() {
            debug!("Found NIMBUS_USERNAME environment variable");
        }
        if env_password.is_some() {
            debug!("Found NIMBUS_PASSWORD environment variable");
        }

        let (endpoint, username, password, dialect, insecure, ca_cert) =
            if let (Some(endpoint), Some(username)) = (&env_endpoint, &env_username) {
                // Environment variables provide complete credentials
                info!("Using Nimbus HCI credentials from environment variables");
                let kind = match env_dialect.as_deref() {
                    Some(raw) => parse_dialect(raw)?,
                    None => DialectKind::Direct,
                };
                let dialect = assemble_dialect(kind, env_cluster.clone())?;
                let insecure = parse_bool(env_insecure.as_deref());
                (
                    endpoint.clone(),
                    username.clone(),
                    env_password.clone(),
                    dialect,
                    insecure,
                    env_ca_cert.clone(),
                )
            } else {
                let (name, profile) = self.config.resolve_profile(profile_name)?;
                info!("Using profile: {}", name);

                // Allow partial environment variable overrides
                let has_overrides = env_endpoint.is_some()
                    || env_username.is_some()
                    || env_password.is_some()
                    || env_dialect.is_some()
                    || env_cluster.is_some()
                    || env_insecure.is_some()
                    || env_ca_cert.is_some();

                let endpoint = env_endpoint.unwrap_or_else(|| profile.endpoint.clone());
                let username = env_username.unwrap_or_else(|| profile.username.clone());
                let password = env_password.or_else(|| profile.password.clone());
                let kind = match env_dialect.as_deref() {
                    Some(raw) => parse_dialect(raw)?,
                    None => profile.dialect,
                };
                let cluster = env_cluster.or_else(|| profile.cluster_uuid.clone());
                let dialect = assemble_dialect(kind, cluster)?;
                let insecure = match env_insecure.as_deref() {
                    Some(raw) => parse_bool(Some(raw)),
                    None => profile.insecure,
                };
                let ca_cert = env_ca_cert.or_else(|| profile.ca_cert.clone());

                if has_overrides {
                    debug!("Applied partial environment variable overrides");
                }

                (endpoint, username, password, dialect, insecure, ca_cert)
            };

        info!("Connecting to Nimbus HCI API: {}", endpoint);
        debug!("Username: {}", username);
        debug!(
            "Password: {}",
            if password.is_some() {
                "configured"
            } else {
                "not set"
            }
        );
        debug!("Dialect: {:?}", dialect);
        debug!("Insecure mode: {}", insecure);

        // Omitted passwords are prompted for interactively
        let password = match password {
            Some(password) => password,
            None => rpassword::prompt_password(format!("Password for {username}@{endpoint}: "))
                .map_err(|e| CliError::InvalidInput {
                    message: format!("failed to read password: {e}"),
                })?,
        };

        let mut builder = HciClient::builder()
            .base_url(&endpoint)
            .username(&username)
            .password(&password)
            .dialect(dialect)
            .user_agent(NIMBUSCTL_USER_AGENT);

        if insecure {
            builder = builder.insecure(true);
            debug!("TLS certificate verification disabled");
        }

        if let Some(ref ca_cert_path) = ca_cert {
            builder = builder.ca_cert(ca_cert_path);
            debug!("Using custom CA certificate: {}", ca_cert_path);
        }

        let client = builder.build()?;
        debug!("Nimbus HCI client created successfully");
        Ok(client)
    }
}

fn parse_dialect(raw: &str) -> CliResult<DialectKind> {
    match raw.to_lowercase().as_str() {
        "direct" => Ok(DialectKind::Direct),
        "proxied" => Ok(DialectKind::Proxied),
        other => Err(CliError::InvalidInput {
            message: format!("invalid NIMBUS_DIALECT '{other}' (valid: direct, proxied)"),
        }),
    }
}

fn assemble_dialect(kind: DialectKind, cluster_uuid: Option<String>) -> CliResult<Dialect> {
    match kind {
        DialectKind::Direct => Ok(Dialect::Direct),
        DialectKind::Proxied => cluster_uuid
            .map(|cluster_uuid| Dialect::Proxied { cluster_uuid })
            .ok_or_else(|| CliError::InvalidInput {
                message: "proxied dialect requires a cluster uuid \
                          (set NIMBUS_CLUSTER_UUID or the profile's cluster_uuid)"
                    .to_string(),
            }),
    }
}

fn parse_bool(raw: Option<&str>) -> bool {
    raw.map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}
