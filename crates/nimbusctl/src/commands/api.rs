//! Raw API access commands for direct REST endpoint calls

use anyhow::Context;
use serde_json::Value;

use crate::cli::{self, HttpMethod};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub async fn handle_api_command(
    conn: &ConnectionManager,
    profile: Option<&str>,
    method: HttpMethod,
    path: String,
    data: Option<String>,
    output: cli::OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let client = conn.create_client(profile)?;
    let normalized_path = normalize_path(path);

    // Parse request body if provided
    let body: Option<Value> = if let Some(data_str) = data {
        if let Some(file_path) = data_str.strip_prefix('@') {
            let content = std::fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read file: {}", file_path))?;
            Some(
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from file: {}", file_path))?,
            )
        } else {
            Some(
                serde_json::from_str(&data_str)
                    .context("Failed to parse JSON from data parameter")?,
            )
        }
    } else {
        None
    };

    let response = match method {
        HttpMethod::Get => client.get(&normalized_path).await?,
        HttpMethod::Post => {
            let body = body.unwrap_or_else(|| serde_json::json!({}));
            client.post(&normalized_path, &body).await?
        }
        HttpMethod::Put => {
            let body = body.unwrap_or_else(|| serde_json::json!({}));
            client.put(&normalized_path, &body).await?
        }
        HttpMethod::Delete => client.delete(&normalized_path).await?,
    };

    print_output(
        &response,
        OutputFormat::resolve(output, OutputFormat::Json),
        query,
    )?;
    Ok(())
}

/// Normalize an endpoint path, prefixing the current API version when
/// the caller left it off.
fn normalize_path(path: String) -> String {
    let with_slash = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };

    // Already versioned (e.g. /v2/vms, /v3/tasks)
    let versioned = with_slash.starts_with("/v")
        && with_slash
            .chars()
            .nth(2)
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false);
    if versioned {
        with_slash
    } else if with_slash == "/" {
        "/v2".to_string()
    } else {
        format!("/v2{}", with_slash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_adds_version_prefix() {
        assert_eq!(normalize_path("/vms".into()), "/v2/vms");
        assert_eq!(normalize_path("vms".into()), "/v2/vms");
        assert_eq!(normalize_path("/".into()), "/v2");
    }

    #[test]
    fn test_normalize_path_keeps_existing_version() {
        assert_eq!(normalize_path("/v2/vms".into()), "/v2/vms");
        assert_eq!(normalize_path("v2/tasks/abc".into()), "/v2/tasks/abc");
        assert_eq!(normalize_path("/v3/future".into()), "/v3/future");
    }

    #[test]
    fn test_normalize_path_versionless_v_word() {
        // "volumes" starts with v but is not a version segment
        assert_eq!(normalize_path("/volumes".into()), "/v2/volumes");
    }
}
