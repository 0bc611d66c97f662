//! Configuration module
//!
//! TOML file, by default `~/.config/oicp-roaming/config.toml`. Every section
//! and every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [hub]
//! base_url = "https://service-qa.hubject.com"
//! format = "soap"
//! timeout_secs = 30
//! client_identity = "/etc/oicp/client.pem"
//!
//! [server]
//! role = "cpo"
//! host = "0.0.0.0"
//! port = 9443
//!
//! [identity]
//! operator_id = "DE*GEF"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::WireFormat;
use crate::domain::{FormatError, OperatorId, ProviderId};
use crate::infrastructure::http::ReqwestTransportConfig;

const CONFIG_DIR: &str = "oicp-roaming";
const CONFIG_FILE: &str = "config.toml";

/// Env var naming an alternative config file.
pub const CONFIG_ENV: &str = "OICP_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid identity in config: {0}")]
    Identity(#[from] FormatError),

    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Cannot read certificate {path}: {source}")]
    Certificate {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `~/.config/oicp-roaming/config.toml`, falling back to the working
/// directory when no config dir is known.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// `$OICP_CONFIG` if set, else [`default_config_path`].
pub fn resolve_config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub hub: HubConfig,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Where and how to reach the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub base_url: String,
    pub format: WireFormat,
    /// Default per-call timeout
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_idle_connections: usize,
    /// PEM file holding the client certificate and its private key
    pub client_identity: Option<PathBuf>,
    /// PEM file with an additional CA for the hub certificate
    pub root_ca: Option<PathBuf>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://service-qa.hubject.com".to_string(),
            format: WireFormat::Soap,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_idle_connections: 10,
            client_identity: None,
            root_ca: None,
        }
    }
}

impl HubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reads the certificate files, if any.
    pub fn transport_config(&self) -> Result<ReqwestTransportConfig, ConfigError> {
        let read = |path: &PathBuf| {
            std::fs::read(path).map_err(|source| ConfigError::Certificate {
                path: path.clone(),
                source,
            })
        };

        Ok(ReqwestTransportConfig {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_idle_connections: self.max_idle_connections,
            identity_pem: self.client_identity.as_ref().map(read).transpose()?,
            root_ca_pem: self.root_ca.as_ref().map(read).transpose()?,
        })
    }
}

/// Which side of the hub this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Charge point operator: pushes EVSE data, asks for authorization,
    /// serves remote commands.
    #[default]
    Cpo,
    /// E-mobility provider: sends remote commands, serves authorization.
    Emp,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpo => "cpo",
            Self::Emp => "emp",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpo" => Ok(Self::Cpo),
            "emp" => Ok(Self::Emp),
            other => Err(format!("unknown role '{}', expected cpo or emp", other)),
        }
    }
}

/// Inbound endpoint the hub calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub role: Role,
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            role: Role::Cpo,
            host: "0.0.0.0".to_string(),
            port: 9443,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Our own party ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    pub provider_id: Option<String>,
}

impl IdentityConfig {
    pub fn operator_id(&self) -> Result<OperatorId, ConfigError> {
        let text = self
            .operator_id
            .as_deref()
            .ok_or(ConfigError::Missing("identity.operator_id"))?;
        Ok(OperatorId::parse(text)?)
    }

    pub fn provider_id(&self) -> Result<ProviderId, ConfigError> {
        let text = self
            .provider_id
            .as_deref()
            .ok_or(ConfigError::Missing("identity.provider_id"))?;
        Ok(ProviderId::parse(text)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Prometheus scrape listener
    pub listen: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "0.0.0.0:9100".to_string(),
        }
    }
}
