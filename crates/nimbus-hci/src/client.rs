//! HTTP client for the HCI management API
//!
//! Build with [`HciClient::builder()`]:
//!
//! ```rust,no_run
//! use nimbus_hci::{Dialect, HciClient};
//!
//! # fn main() -> Result<(), nimbus_hci::RestError> {
//! let client = HciClient::builder()
//!     .base_url("https://cluster.example.com:9440")
//!     .username("admin")
//!     .password("secret")
//!     .dialect(Dialect::Direct)
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! The client is cheap to clone; every handler holds its own clone.

use crate::clusters::ClusterHandler;
use crate::dialect::Dialect;
use crate::error::{RestError, Result};
use crate::images::ImageHandler;
use crate::subnets::SubnetHandler;
use crate::tasks::TaskHandler;
use crate::vms::VmHandler;
use crate::volume_groups::VolumeGroupHandler;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!("nimbus-hci/", env!("CARGO_PKG_VERSION"));

/// Client for the HCI management API
#[derive(Clone)]
pub struct HciClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
    dialect: Dialect,
}

impl fmt::Debug for HciClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HciClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl HciClient {
    /// Start building a client
    pub fn builder() -> HciClientBuilder {
        HciClientBuilder::default()
    }

    /// The backend dialect this client was built for
    #[must_use]
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The management endpoint this client talks to
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ====== Handler accessors ======

    pub fn vms(&self) -> VmHandler {
        VmHandler::new(self.clone())
    }

    pub fn volume_groups(&self) -> VolumeGroupHandler {
        VolumeGroupHandler::new(self.clone())
    }

    pub fn images(&self) -> ImageHandler {
        ImageHandler::new(self.clone())
    }

    pub fn subnets(&self) -> SubnetHandler {
        SubnetHandler::new(self.clone())
    }

    pub fn tasks(&self) -> TaskHandler {
        TaskHandler::new(self.clone())
    }

    pub fn clusters(&self) -> ClusterHandler {
        ClusterHandler::new(self.clone())
    }

    // ====== Verb helpers ======

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None).await
    }

    /// Issue a single request and decode the JSON response body.
    ///
    /// An empty body on a success status decodes to `Value::Null`. In the
    /// proxied dialect the fleet-manager routing parameter is appended to
    /// every request.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = self.build_url(path)?;
        debug!("{} {}", method, url.path());

        let mut req = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(map_transport_error)?;
        let status = resp.status();
        let text = resp.text().await.map_err(map_transport_error)?;
        trace!("HTTP {} ({} bytes)", status, text.len());

        if !status.is_success() {
            return Err(RestError::from_status(status.as_u16(), path, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| RestError::InvalidResponse(format!("body is not valid JSON: {e}")))
    }

    /// Issue a multipart upload (image content and the like)
    pub async fn put_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value> {
        let url = self.build_url(path)?;
        debug!("PUT {} (multipart)", url.path());

        let resp = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = resp.status();
        let text = resp.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(RestError::from_status(status.as_u16(), path, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| RestError::InvalidResponse(format!("body is not valid JSON: {e}")))
    }

    fn build_url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        );
        let mut url =
            Url::parse(&joined).map_err(|e| RestError::InvalidUrl(format!("{joined}: {e}")))?;
        if let Some((param, value)) = self.dialect.proxy_param() {
            url.query_pairs_mut().append_pair(param, value);
        }
        Ok(url)
    }
}

fn map_transport_error(e: reqwest::Error) -> RestError {
    if e.is_timeout() {
        RestError::Timeout
    } else if e.is_connect() {
        RestError::ConnectionFailed(e.to_string())
    } else {
        RestError::Request(e)
    }
}

/// Builder for [`HciClient`]
#[derive(Default)]
pub struct HciClientBuilder {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    dialect: Option<Dialect>,
    insecure: bool,
    ca_cert: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HciClientBuilder {
    /// Start an empty builder; equivalent to [`HciClient::builder()`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Management endpoint, e.g. `https://cluster.example.com:9440`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Backend dialect; defaults to [`Dialect::Direct`]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Skip TLS certificate verification (self-signed cluster certs)
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Path to an additional PEM root certificate to trust
    pub fn ca_cert(mut self, path: impl Into<String>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Per-request timeout; defaults to 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<HciClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| RestError::Config("base URL is required".to_string()))?;
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| RestError::InvalidUrl(format!("{base_url}: {e}")))?;
        let username = self
            .username
            .ok_or_else(|| RestError::Config("username is required".to_string()))?;
        let password = self
            .password
            .ok_or_else(|| RestError::Config("password is required".to_string()))?;

        let mut http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            );
        if self.insecure {
            http = http.danger_accept_invalid_certs(true);
        }
        if let Some(path) = self.ca_cert {
            let pem = std::fs::read(&path)
                .map_err(|e| RestError::Tls(format!("cannot read CA cert {path}: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| RestError::Tls(format!("invalid CA cert {path}: {e}")))?;
            http = http.add_root_certificate(cert);
        }
        let http = http.build().map_err(RestError::Request)?;

        Ok(HciClient {
            http,
            base_url,
            username,
            password,
            dialect: self.dialect.unwrap_or(Dialect::Direct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> HciClientBuilder {
        HciClient::builder()
            .base_url("https://cluster.example.com:9440")
            .username("admin")
            .password("secret")
    }

    #[test]
    fn test_build_minimal() {
        let client = minimal().build().unwrap();
        assert_eq!(client.dialect(), &Dialect::Direct);
        // Url normalizes the empty path to "/"
        assert_eq!(
            client.base_url().as_str(),
            "https://cluster.example.com:9440/"
        );
    }

    #[test]
    fn test_build_requires_base_url_and_credentials() {
        let err = HciClient::builder().build().unwrap_err();
        assert!(err.to_string().contains("base URL"));

        let err = HciClient::builder()
            .base_url("https://cluster.example.com:9440")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("username"));

        let err = HciClient::builder()
            .base_url("https://cluster.example.com:9440")
            .username("admin")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_build_rejects_bad_url() {
        let err = minimal().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, RestError::InvalidUrl(_)));
    }

    #[test]
    fn test_proxied_dialect_adds_query_param() {
        let client = minimal()
            .dialect(Dialect::Proxied {
                cluster_uuid: "0005a-b".into(),
            })
            .build()
            .unwrap();
        let url = client.build_url("/v2/tasks/t-1").unwrap();
        assert_eq!(url.path(), "/v2/tasks/t-1");
        assert_eq!(url.query(), Some("proxyClusterUuid=0005a-b"));
    }

    #[test]
    fn test_direct_dialect_has_no_query_param() {
        let client = minimal().build().unwrap();
        let url = client.build_url("/v2/tasks/t-1").unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let client = minimal().build().unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("secret"));
    }
}
