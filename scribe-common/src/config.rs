//! Configuration loading
//!
//! One TOML file configures both the client engine and the lock server:
//!
//! ```toml
//! [client]
//! backend_url = "https://archive.example.org/api"
//! request_timeout_secs = 30
//! status_poll_interval_secs = 10
//!
//! [lockd]
//! port = 5780
//! lock_ttl_secs = 3600
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SCRIBE_CONFIG` for the file, `SCRIBE_BACKEND_URL` for the URL)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not an error; a malformed one is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SCRIBE_CONFIG";
/// Environment variable overriding `client.backend_url`
pub const BACKEND_URL_ENV_VAR: &str = "SCRIBE_BACKEND_URL";

const DEFAULT_PORT: u16 = 5780;

/// Whole config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub lockd: LockdConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session engine settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend exposing `/session/*`
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Timeout for each start/cancel/submit round trip
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How often the advisory concurrency flag is re-read
    #[serde(default = "default_status_poll_interval_secs")]
    pub status_poll_interval_secs: u64,

    /// Broadcast buffer for outbound events
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

/// Lock server settings
#[derive(Debug, Clone, Deserialize)]
pub struct LockdConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Locks untouched for this long are treated as abandoned.
    /// Absent means locks never expire.
    #[serde(default)]
    pub lock_ttl_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_backend_url() -> String {
    format!("http://127.0.0.1:{DEFAULT_PORT}")
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_status_poll_interval_secs() -> u64 {
    10
}

fn default_event_bus_capacity() -> usize {
    256
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            status_poll_interval_secs: default_status_poll_interval_secs(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs.max(1))
    }
}

impl Default for LockdConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            lock_ttl_secs: None,
        }
    }
}

impl LockdConfig {
    pub fn lock_ttl(&self) -> Option<Duration> {
        self.lock_ttl_secs.map(Duration::from_secs)
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve and load the config file, falling back to defaults when none exists
    ///
    /// `cli_path` wins over `SCRIBE_CONFIG`, which wins over the platform
    /// config directory (`~/.config/scribe/config.toml` on Linux).
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let explicit = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        if let Some(path) = explicit {
            // An explicitly named file must exist
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading config from {}", path.display());
            return Self::from_file(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "No config file at {}; using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory; using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply `SCRIBE_BACKEND_URL` and then a command-line URL on top of the file values
    pub fn with_backend_override(mut self, cli_backend_url: Option<&str>) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                self.client.backend_url = url;
            }
        }
        if let Some(url) = cli_backend_url {
            self.client.backend_url = url.to_string();
        }
        self
    }
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scribe").join("config.toml"))
}
