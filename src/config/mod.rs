//! Configuration management for the component server
//!
//! Configuration comes from environment variables or a TOML file; the binary
//! applies command-line overrides on top and validates the result.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineConfig, Language};

/// Default listener port of the component
pub const DEFAULT_PORT: u16 = 9714;

/// Default request body limit, shared by the DUUI components
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16_777_215;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid value for environment variable {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Tagging engine configuration
    pub engine: EngineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Execution policy of the listener
///
/// Serialized as the worker count of the command line: `1` for a single
/// worker, `n > 1` for a fixed pool, anything else for a cached pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum WorkerPolicy {
    Single,
    Fixed(usize),
    #[default]
    Cached,
}

impl WorkerPolicy {
    pub fn from_workers(workers: i64) -> Self {
        match workers {
            1 => Self::Single,
            n if n > 1 => Self::Fixed(n as usize),
            _ => Self::Cached,
        }
    }

    /// Number of worker threads, `None` for a pool sized by the runtime
    pub fn threads(self) -> Option<usize> {
        match self {
            Self::Single => Some(1),
            Self::Fixed(n) => Some(n),
            Self::Cached => None,
        }
    }
}

impl From<i64> for WorkerPolicy {
    fn from(workers: i64) -> Self {
        Self::from_workers(workers)
    }
}

impl From<WorkerPolicy> for i64 {
    fn from(policy: WorkerPolicy) -> Self {
        match policy {
            WorkerPolicy::Single => 1,
            WorkerPolicy::Fixed(n) => n as i64,
            WorkerPolicy::Cached => -1,
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind_address: IpAddr,

    /// Port to bind, 0 for an ephemeral port
    pub port: u16,

    /// Worker thread policy
    pub workers: WorkerPolicy,

    /// Maximum accepted request body in bytes
    pub max_payload_bytes: usize,

    /// Log every request through the tower-http trace layer
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            workers: WorkerPolicy::Cached,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_SIZE,
            enable_request_logging: true,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::invalid(
                "max_payload_bytes",
                "Must accept at least one byte",
            ));
        }
        Ok(())
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_address: Option<IpAddr>,
    port: Option<u16>,
    workers: Option<WorkerPolicy>,
    max_payload_bytes: Option<usize>,
    enable_request_logging: Option<bool>,
}

impl ServerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: IpAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(
            addr.parse()
                .map_err(|_| ConfigError::invalid("bind_address", format!("Invalid address: {addr}")))?,
        );
        Ok(self)
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set worker policy
    pub fn workers(mut self, workers: WorkerPolicy) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set request body limit
    pub fn max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = Some(bytes);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            bind_address: self.bind_address.unwrap_or(defaults.bind_address),
            port: self.port.unwrap_or(defaults.port),
            workers: self.workers.unwrap_or(defaults.workers),
            max_payload_bytes: self.max_payload_bytes.unwrap_or(defaults.max_payload_bytes),
            enable_request_logging: self
                .enable_request_logging
                .unwrap_or(defaults.enable_request_logging),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid(
                "logging.format",
                format!("Unknown format '{other}', expected text or json"),
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: LogFormat::Text,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn env_var<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(port) = env_var("DUUI_PORT")? {
            config.server.port = port;
        }
        if let Some(workers) = env_var::<i64>("DUUI_WORKERS")? {
            config.server.workers = WorkerPolicy::from_workers(workers);
        }
        if let Some(address) = env_var("DUUI_BIND_ADDRESS")? {
            config.server.bind_address = address;
        }
        if let Some(bytes) = env_var("MAX_PAYLOAD_SIZE")? {
            config.server.max_payload_bytes = bytes;
        }
        if let Ok(language) = std::env::var("DUUI_DEFAULT_LANGUAGE") {
            config.engine.default_language = language;
        }
        if let Ok(level) = std::env::var("DUUI_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_var("DUUI_LOG_FORMAT")? {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;

        Language::from_tag(&self.engine.default_language).map_err(|e| {
            ConfigError::invalid("engine.default_language", e.to_string())
        })?;

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("Unknown level '{}'", self.logging.level),
            ));
        }

        Ok(())
    }
}
