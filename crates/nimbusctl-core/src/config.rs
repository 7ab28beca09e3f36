//! Profile-based configuration.
//!
//! Profiles live in a TOML file and name everything needed to reach a
//! cluster or a prism gateway: endpoint, credentials, dialect, and TLS
//! options. `${VAR}` references in the file are expanded from the
//! environment at load time, so passwords can stay out of the file
//! itself:
//!
//! ```toml
//! default_profile = "lab"
//!
//! [profiles.lab]
//! endpoint = "https://cluster-a.lab.example.com:9440"
//! username = "admin"
//! password = "${NIMBUS_LAB_PASSWORD}"
//!
//! [profiles.prod]
//! endpoint = "https://prism.example.com:9440"
//! username = "svc-automation"
//! dialect = "proxied"
//! cluster_uuid = "0005a1b2-c3d4-e5f6-0708-090a0b0c0d0e"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nimbus_hci::Dialect;

/// Problems loading, saving, or resolving profiles.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("profile '{name}' not found. Available profiles: {available}")]
    ProfileNotFound { name: String, available: String },

    #[error("no profiles configured. Run 'nimbusctl profile set <name>' to create one")]
    NoProfiles,

    #[error(
        "no default profile set. Pass --profile or run 'nimbusctl profile default <name>'. \
         Available profiles: {available}"
    )]
    NoDefaultProfile { available: String },

    #[error("profile '{name}' uses the proxied dialect but sets no cluster_uuid")]
    MissingClusterUuid { name: String },

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("cannot determine a config directory on this platform")]
    NoConfigDir,
}

/// Which status vocabulary a profile speaks.
///
/// The serialized form is what appears in the config file and on the
/// command line; [`Profile::dialect`] turns it into the client-level
/// [`Dialect`] with the cluster uuid attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// Talk to a cluster directly.
    #[default]
    Direct,
    /// Talk to a prism gateway that fans out to managed clusters.
    Proxied,
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialectKind::Direct => write!(f, "direct"),
            DialectKind::Proxied => write!(f, "proxied"),
        }
    }
}

/// One named connection target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the management API, e.g. `https://host:9440`.
    pub endpoint: String,
    pub username: String,
    /// Omitted passwords are prompted for interactively by the CLI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub dialect: DialectKind,
    /// Target cluster when the dialect is proxied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_uuid: Option<String>,
    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
    /// Path to a PEM CA bundle to trust in addition to the system
    /// roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
}

impl Profile {
    /// Client-level dialect for this profile.
    ///
    /// Proxied profiles must carry the cluster uuid the gateway should
    /// route to; `name` is only used for the error message.
    pub fn dialect(&self, name: &str) -> Result<Dialect, ConfigError> {
        match self.dialect {
            DialectKind::Direct => Ok(Dialect::Direct),
            DialectKind::Proxied => {
                let cluster_uuid =
                    self.cluster_uuid
                        .clone()
                        .ok_or_else(|| ConfigError::MissingClusterUuid {
                            name: name.to_string(),
                        })?;
                Ok(Dialect::Proxied { cluster_uuid })
            }
        }
    }
}

/// The whole config file: a default profile name plus named profiles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Load from the default location. A missing file is an empty
    /// config, not an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load from an explicit path, expanding `${VAR}` references.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let expanded = Self::expand_env_vars(&content);
        Ok(toml::from_str(&expanded)?)
    }

    /// Save to the default location, creating parent directories.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save to an explicit path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Default config file location.
    ///
    /// `NIMBUSCTL_CONFIG` overrides everything. On macOS a Linux-style
    /// `~/.config/nimbusctl/config.toml` is preferred when it already
    /// exists, so configs move between machines without surprises.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os("NIMBUSCTL_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        #[cfg(target_os = "macos")]
        {
            if let Some(home) = std::env::var_os("HOME") {
                let linux_style = PathBuf::from(home)
                    .join(".config")
                    .join("nimbusctl")
                    .join("config.toml");
                if linux_style.exists() {
                    return Ok(linux_style);
                }
            }
        }

        ProjectDirs::from("com", "nimbus", "nimbusctl")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Pick the profile to use: an explicit name, else the configured
    /// default, else the only profile there is.
    pub fn resolve_profile(
        &self,
        explicit: Option<&str>,
    ) -> Result<(&str, &Profile), ConfigError> {
        if let Some(name) = explicit {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                    available: self.available(),
                });
        }

        if let Some(name) = &self.default_profile {
            return self
                .profiles
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.clone(),
                    available: self.available(),
                });
        }

        match self.profiles.len() {
            0 => Err(ConfigError::NoProfiles),
            1 => {
                let (name, profile) = self
                    .profiles
                    .iter()
                    .next()
                    .map(|(k, v)| (k.as_str(), v))
                    .ok_or(ConfigError::NoProfiles)?;
                Ok((name, profile))
            }
            _ => Err(ConfigError::NoDefaultProfile {
                available: self.available(),
            }),
        }
    }

    /// Look up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Add or replace a profile.
    pub fn set_profile(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Remove a profile. Clears the default if it pointed at the
    /// removed profile. Returns whether anything was removed.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        let removed = self.profiles.remove(name).is_some();
        if removed && self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        removed
    }

    /// Profiles sorted by name, for stable listings.
    #[must_use]
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut entries: Vec<_> = self.profiles.iter().collect();
        entries.sort_by_key(|(name, _)| name.as_str());
        entries
    }

    fn available(&self) -> String {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        if names.is_empty() {
            return "(none)".to_string();
        }
        names.sort_unstable();
        names.join(", ")
    }

    /// Expand `${VAR}` references from the environment. Unset
    /// variables are left as-is so the error surfaces where the value
    /// is used, not as a parse failure.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lab_profile() -> Profile {
        Profile {
            endpoint: "https://cluster-a.lab.example.com:9440".into(),
            username: "admin".into(),
            password: Some("secret".into()),
            dialect: DialectKind::Direct,
            cluster_uuid: None,
            insecure: false,
            ca_cert: None,
        }
    }

    fn prod_profile() -> Profile {
        Profile {
            endpoint: "https://prism.example.com:9440".into(),
            username: "svc-automation".into(),
            password: Some("hunter2".into()),
            dialect: DialectKind::Proxied,
            cluster_uuid: Some("0005a1b2-c3d4".into()),
            insecure: false,
            ca_cert: None,
        }
    }

    #[test]
    fn missing_file_loads_as_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(&dir.path().join("nope.toml")).unwrap();
        assert!(config.profiles.is_empty());
        assert!(config.default_profile.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_profile("lab", lab_profile());
        config.set_profile("prod", prod_profile());
        config.default_profile = Some("lab".into());
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("lab"));
        assert_eq!(loaded.profiles.len(), 2);
        assert_eq!(loaded.profile("prod").unwrap(), &prod_profile());
    }

    #[test]
    fn serialized_form_omits_empty_optionals() {
        let mut config = Config::default();
        let mut profile = lab_profile();
        profile.password = None;
        config.set_profile("lab", profile);

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[profiles.lab]"));
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("insecure"));
        assert!(!rendered.contains("cluster_uuid"));
    }

    #[test]
    fn resolve_explicit_name() {
        let mut config = Config::default();
        config.set_profile("lab", lab_profile());
        let (name, _) = config.resolve_profile(Some("lab")).unwrap();
        assert_eq!(name, "lab");

        let err = config.resolve_profile(Some("staging")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { .. }));
        assert!(err.to_string().contains("Available profiles: lab"));
    }

    #[test]
    fn resolve_falls_back_to_default_then_single() {
        let mut config = Config::default();
        config.set_profile("lab", lab_profile());
        config.set_profile("prod", prod_profile());
        config.default_profile = Some("prod".into());
        let (name, _) = config.resolve_profile(None).unwrap();
        assert_eq!(name, "prod");

        config.default_profile = None;
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoDefaultProfile { .. }));

        config.remove_profile("prod");
        let (name, _) = config.resolve_profile(None).unwrap();
        assert_eq!(name, "lab");

        config.remove_profile("lab");
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::NoProfiles));
    }

    #[test]
    fn dangling_default_is_reported() {
        let mut config = Config::default();
        config.set_profile("lab", lab_profile());
        config.default_profile = Some("gone".into());
        let err = config.resolve_profile(None).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { name, .. } if name == "gone"));
    }

    #[test]
    fn remove_profile_clears_matching_default() {
        let mut config = Config::default();
        config.set_profile("lab", lab_profile());
        config.default_profile = Some("lab".into());

        assert!(config.remove_profile("lab"));
        assert!(config.default_profile.is_none());
        assert!(!config.remove_profile("lab"));
    }

    #[test]
    fn dialect_conversion_checks_cluster_uuid() {
        let direct = lab_profile().dialect("lab").unwrap();
        assert_eq!(direct, Dialect::Direct);

        let proxied = prod_profile().dialect("prod").unwrap();
        assert_eq!(
            proxied,
            Dialect::Proxied {
                cluster_uuid: "0005a1b2-c3d4".into()
            }
        );

        let mut broken = prod_profile();
        broken.cluster_uuid = None;
        let err = broken.dialect("prod").unwrap_err();
        assert!(matches!(err, ConfigError::MissingClusterUuid { name } if name == "prod"));
    }

    #[test]
    #[serial_test::serial]
    fn env_vars_expand_at_load_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[profiles.lab]
endpoint = "https://cluster-a.lab.example.com:9440"
username = "admin"
password = "${NIMBUSCTL_TEST_PASSWORD}"
"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("NIMBUSCTL_TEST_PASSWORD", "from-env");
        }
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(
            loaded.profile("lab").unwrap().password.as_deref(),
            Some("from-env")
        );
        unsafe {
            std::env::remove_var("NIMBUSCTL_TEST_PASSWORD");
        }

        // Unset variables are left unexpanded rather than failing.
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(
            loaded.profile("lab").unwrap().password.as_deref(),
            Some("${NIMBUSCTL_TEST_PASSWORD}")
        );
    }

    #[test]
    #[serial_test::serial]
    fn config_path_env_override_wins() {
        unsafe {
            std::env::set_var("NIMBUSCTL_CONFIG", "/tmp/custom-nimbus.toml");
        }
        let path = Config::config_path().unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom-nimbus.toml"));
        unsafe {
            std::env::remove_var("NIMBUSCTL_CONFIG");
        }
    }
}
