//! Client configuration
//!
//! Loaded from environment variables or a TOML file:
//!
//! | Variable                  | Default          | Description                        |
//! |---------------------------|------------------|------------------------------------|
//! | `TSDB_ADDR`               | `127.0.0.1:6379` | Server address (`host:port`)       |
//! | `TSDB_CLIENT_NAME`        | unset            | Sent with `CLIENT SETNAME`         |
//! | `TSDB_MAX_CONNECTIONS`    | 16               | Cap on concurrently used sockets   |
//! | `TSDB_IDLE_CONNECTIONS`   | 8                | Idle sockets kept for reuse        |
//! | `TSDB_CONNECT_TIMEOUT_MS` | 5000             | Connect timeout in milliseconds    |

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:6379";
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;
pub const DEFAULT_IDLE_CONNECTIONS: usize = 8;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings for [`TcpTransport`](crate::TcpTransport)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address
    pub addr: String,
    /// Connection name reported by `CLIENT LIST`
    pub client_name: Option<String>,
    /// Maximum connections in use at once
    pub max_connections: usize,
    /// Idle connections retained between calls
    pub idle_connections: usize,
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: DEFAULT_ADDR.to_string(),
            client_name: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            idle_connections: DEFAULT_IDLE_CONNECTIONS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        ClientConfig {
            addr: addr.into(),
            ..Self::default()
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load configuration from environment variables. Unparsable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        ClientConfig {
            addr: std::env::var("TSDB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            client_name: std::env::var("TSDB_CLIENT_NAME").ok(),
            max_connections: std::env::var("TSDB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            idle_connections: std::env::var("TSDB_IDLE_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_IDLE_CONNECTIONS),
            connect_timeout_ms: std::env::var("TSDB_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
