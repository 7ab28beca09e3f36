//! Error types for nimbusctl
//!
//! Wraps the client and core error types into CLI-facing variants that
//! know how to print themselves with actionable suggestions.

use colored::Colorize;
use nimbus_hci::RestError;
use nimbusctl_core::{ConfigError, CoreError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: list available profiles:
///       nimbusctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    #[allow(dead_code)]
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the nimbusctl application
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Task error: {message}")]
    TaskError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for nimbusctl operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::ProfileNotFound { name } => vec![
                "List available profiles: nimbusctl profile list".to_string(),
                format!(
                    "Create profile '{name}': nimbusctl profile set {name} --endpoint <url> --username <user>"
                ),
            ],
            CliError::Configuration { message } if message.contains("profile") => vec![
                "Create a profile: nimbusctl profile set <name> --endpoint https://host:9440 --username admin".to_string(),
                "Pick a default: nimbusctl profile default <name>".to_string(),
                "View profile documentation: nimbusctl profile --help".to_string(),
            ],
            CliError::AuthenticationFailed { .. } => vec![
                "Check your credentials: nimbusctl profile show <profile>".to_string(),
                "Verify username and password are correct".to_string(),
                "Set NIMBUS_USERNAME / NIMBUS_PASSWORD to override the profile".to_string(),
            ],
            CliError::ConnectionError { message }
                if message.contains("certificate") || message.contains("TLS") =>
            {
                vec![
                    "For self-signed certificates, recreate the profile with --insecure".to_string(),
                    "Or point --ca-cert at the cluster's CA bundle".to_string(),
                ]
            }
            CliError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint URL: nimbusctl profile show <profile>".to_string(),
            ],
            CliError::ApiError { message } if message.contains("not found") => vec![
                "Verify the resource uuid or name is correct".to_string(),
                "List resources to find the right one, e.g. nimbusctl vm list".to_string(),
            ],
            CliError::TaskError { .. } => vec![
                "Inspect the task: nimbusctl task get <task-uuid>".to_string(),
            ],
            CliError::Timeout { .. } => vec![
                "Raise the budget with --wait-timeout <seconds>".to_string(),
                "Or follow the task later: nimbusctl task watch <task-uuid>".to_string(),
            ],
            CliError::InvalidInput { .. } => vec![
                "Check the command syntax: nimbusctl <command> --help".to_string(),
            ],
            CliError::FileError { path, .. } => vec![
                format!("Check that the file exists: {path}"),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<RestError> for CliError {
    fn from(err: RestError) -> Self {
        if err.is_unauthorized() {
            return CliError::AuthenticationFailed {
                message: err.to_string(),
            };
        }
        if err.is_timeout() {
            return CliError::Timeout {
                message: err.to_string(),
            };
        }
        match err {
            RestError::ConnectionFailed(message) => CliError::ConnectionError { message },
            RestError::Tls(message) => CliError::ConnectionError {
                message: format!("TLS: {message}"),
            },
            RestError::Request(e) if e.is_connect() => CliError::ConnectionError {
                message: e.to_string(),
            },
            other => CliError::ApiError {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, .. } => CliError::ProfileNotFound { name },
            other => CliError::Configuration {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Api(rest) => rest.into(),
            CoreError::Validation(message) => CliError::InvalidInput { message },
            CoreError::Config(config) => config.into(),
            timeout @ CoreError::TaskTimeout { .. } => CliError::Timeout {
                message: timeout.to_string(),
            },
            other => CliError::TaskError {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Configuration {
            message: err.to_string(),
        }
    }
}
