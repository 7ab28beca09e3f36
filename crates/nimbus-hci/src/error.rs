//! Error types for the Nimbus HCI REST client
//!
//! Every API call returns [`RestError`] on failure. Predicate helpers
//! (`is_not_found`, `is_retryable`, ...) let callers branch on error
//! class without matching variants directly.

use thiserror::Error;

/// Errors returned by the HCI REST client
#[derive(Error, Debug)]
pub enum RestError {
    /// Could not reach the management endpoint at all
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured client timeout
    #[error("Request timed out")]
    Timeout,

    /// HTTP 401 - credentials rejected
    #[error("Authentication failed: invalid username or password")]
    AuthenticationFailed,

    /// HTTP 403 - authenticated but not allowed
    #[error("Permission denied")]
    PermissionDenied,

    /// HTTP 404
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// HTTP 400
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// HTTP 409/412
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// HTTP 429
    #[error("Rate limited by the management API")]
    RateLimited,

    /// HTTP 5xx
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-success HTTP status
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Response body was not the JSON we expected
    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),

    /// Base URL could not be parsed or joined
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// TLS setup problem (unreadable or malformed CA certificate)
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Client was built with missing or inconsistent settings
    #[error("Client configuration error: {0}")]
    Config(String),

    /// JSON encoding of a request body or decoding of a response failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level error from the underlying HTTP client
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, RestError>;

impl RestError {
    /// Map a non-success HTTP status plus response body to an error variant
    pub(crate) fn from_status(status: u16, path: &str, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            400 => RestError::BadRequest { message },
            401 => RestError::AuthenticationFailed,
            403 => RestError::PermissionDenied,
            404 => RestError::NotFound {
                path: path.to_string(),
            },
            409 | 412 => RestError::Conflict { message },
            429 => RestError::RateLimited,
            500..=599 => RestError::ServerError { status, message },
            _ => RestError::ApiError { status, message },
        }
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::NotFound { .. })
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            RestError::AuthenticationFailed | RestError::PermissionDenied
        )
    }

    /// Returns true if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, RestError::ServerError { .. })
    }

    /// Returns true if this is a timeout error
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RestError::Timeout => true,
            RestError::Request(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if this is a rate limiting error (429)
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RestError::RateLimited)
    }

    /// Returns true if this is a conflict/precondition error (409/412)
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, RestError::Conflict { .. })
    }

    /// Returns true if this is a bad request error (400)
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, RestError::BadRequest { .. })
    }

    /// Returns true if retrying the same request might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            RestError::ConnectionFailed(_)
            | RestError::Timeout
            | RestError::RateLimited
            | RestError::ServerError { .. } => true,
            RestError::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// The API usually returns `{"message": "..."}` or `{"error": "..."}`;
/// fall back to the raw body, truncated so log lines stay sane.
fn extract_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "error_detail", "reason"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no error detail provided".to_string();
    }
    const MAX: usize = 200;
    match trimmed.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
