//! Backend API dialect selection
//!
//! The management API exists in two generations. The newer one is reached
//! directly and reports task state in a `status` field. The older one sits
//! behind a fleet-manager proxy, needs a `proxyClusterUuid` query parameter
//! on every request, and reports task state in a `progress_status` field
//! whose in-progress vocabulary additionally includes `none` (emitted while
//! the task is still being scheduled).
//!
//! The dialect is chosen once, at client construction. Nothing downstream
//! re-derives it from request parameters.

use serde_json::Value;
use std::fmt;

/// Query parameter routing a request through the fleet-manager proxy
/// to a specific managed cluster.
pub const PROXY_CLUSTER_PARAM: &str = "proxyClusterUuid";

/// Terminal status value indicating success, in both dialects.
const SUCCEEDED: &str = "succeeded";

/// Which generation of the management API this client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// Newer API generation, addressed directly
    Direct,
    /// Older API generation, reached through the fleet-manager proxy
    /// for the given managed cluster
    Proxied { cluster_uuid: String },
}

impl Dialect {
    /// Field of the task payload that carries the status string
    #[must_use]
    pub fn status_field(&self) -> &'static str {
        match self {
            Dialect::Direct => "status",
            Dialect::Proxied { .. } => "progress_status",
        }
    }

    /// Extract the status string from a task payload
    #[must_use]
    pub fn status_of<'a>(&self, detail: &'a Value) -> Option<&'a str> {
        detail.get(self.status_field()).and_then(Value::as_str)
    }

    /// Whether the given status is still in progress (case-insensitive).
    ///
    /// Anything outside the in-progress set is terminal.
    #[must_use]
    pub fn is_in_progress(&self, status: &str) -> bool {
        let in_progress: &[&str] = match self {
            Dialect::Direct => &["queued", "running"],
            Dialect::Proxied { .. } => &["queued", "running", "none"],
        };
        in_progress.iter().any(|s| status.eq_ignore_ascii_case(s))
    }

    /// Query parameter to append to every request, if any
    #[must_use]
    pub fn proxy_param(&self) -> Option<(&'static str, &str)> {
        match self {
            Dialect::Direct => None,
            Dialect::Proxied { cluster_uuid } => Some((PROXY_CLUSTER_PARAM, cluster_uuid)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Direct => write!(f, "direct"),
            Dialect::Proxied { cluster_uuid } => write!(f, "proxied({})", cluster_uuid),
        }
    }
}

/// Whether a terminal status string is the success marker (case-insensitive)
#[must_use]
pub fn is_success(status: &str) -> bool {
    status.eq_ignore_ascii_case(SUCCEEDED)
}
