//! Configuration loading for zeropush-relay.
//!
//! Configuration is loaded from a TOML file (default: `zeropush.toml`) and
//! may be overridden from the command line or `ZEROPUSH_*` environment
//! variables (see `main.rs`).

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for zeropush-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// APNs certificates.
    #[serde(default)]
    pub apns: ApnsConfig,
    /// FCM credentials.
    #[serde(default)]
    pub fcm: FcmConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the push endpoint (default: 0.0.0.0:1337).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// PKCS#1 PEM private key used to open push identifiers.
    #[serde(default = "default_private_key_file")]
    pub private_key_file: PathBuf,
    /// JSON key under which the base64 envelope is placed in provider payloads.
    #[serde(default = "default_push_json_key")]
    pub push_json_key: String,
    /// Maximum accepted request body in bytes (default: 256KB).
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

/// APNs configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApnsConfig {
    /// PEM bundles (certificate + key); gateway picked from the certificate.
    #[serde(default)]
    pub certs: Vec<PathBuf>,
    /// PEM bundles always sent to the development gateway.
    #[serde(default)]
    pub dev_voip_certs: Vec<PathBuf>,
}

/// FCM configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FcmConfig {
    /// Credentials of the form `appID:apiKey`.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Enable metrics endpoint (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (default: info).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// Multi-line human-readable output.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:1337".to_string()
}

fn default_private_key_file() -> PathBuf {
    PathBuf::from("relay.pem")
}

fn default_push_json_key() -> String {
    "data".to_string()
}

fn default_max_request_bytes() -> usize {
    256 * 1024 // 256KB
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            private_key_file: default_private_key_file(),
            push_json_key: default_push_json_key(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Total number of provider credentials configured.
    pub fn provider_count(&self) -> usize {
        self.apns.certs.len() + self.apns.dev_voip_certs.len() + self.fcm.api_keys.len()
    }

    /// Check values that serde defaults cannot guard.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "server.bind_address must not be empty".into(),
            });
        }
        if self.server.private_key_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "server.private_key_file must not be empty".into(),
            });
        }
        if self.server.push_json_key.is_empty() || self.server.push_json_key == "aps" {
            return Err(ConfigError::Invalid {
                reason: "server.push_json_key must be non-empty and not \"aps\"".into(),
            });
        }
        if self.server.max_request_bytes == 0 {
            return Err(ConfigError::Invalid {
                reason: "server.max_request_bytes must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}
