//! Process configuration
//!
//! Loaded once at startup and passed by reference into the pool builder,
//! the file service and the HTTP server. Sources, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.yaml` (optional)
//! 3. Environment variables (`LISTEN_HOST`, `POSTGRES_HOST`, ...)
//!
//! `.env` files are loaded by the binary before `AppConfig::load` runs.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid listen address '{0}'")]
    ListenAddr(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub is_debug: bool,
    pub listen: ListenConfig,
    pub postgres: PostgresConfig,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 50051,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,

    /// Full connection string; takes precedence over the discrete fields.
    pub url: Option<String>,

    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_retry_delay_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            url: None,
            max_connections: 10,
            connect_attempts: 4,
            connect_retry_delay_secs: 5,
        }
    }
}

impl PostgresConfig {
    /// Connection string for sqlx.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_secs(self.connect_retry_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Upper bound on a single request, admission wait included.
    /// Zero disables the server-side deadline.
    pub request_timeout_secs: u64,

    /// Largest accepted upload payload (decoded bytes).
    pub max_upload_bytes: usize,

    /// Allow any CORS origin (default: localhost only)
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_upload_bytes: 32 * 1024 * 1024,
            cors_permissive: false,
        }
    }
}

impl ServerSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl AppConfig {
    /// Load configuration from an optional YAML file plus the process
    /// environment.
    ///
    /// An explicitly passed path must exist; the default `config.yaml` is
    /// skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("IS_DEBUG") {
            self.is_debug = parse_value("IS_DEBUG", &v)?;
        }
        if let Some(v) = lookup("LISTEN_HOST") {
            self.listen.host = v;
        }
        if let Some(v) = lookup("LISTEN_PORT") {
            self.listen.port = parse_value("LISTEN_PORT", &v)?;
        }
        if let Some(v) = lookup("POSTGRES_HOST") {
            self.postgres.host = v;
        }
        if let Some(v) = lookup("POSTGRES_PORT") {
            self.postgres.port = parse_value("POSTGRES_PORT", &v)?;
        }
        if let Some(v) = lookup("POSTGRES_DATABASE") {
            self.postgres.database = v;
        }
        if let Some(v) = lookup("POSTGRES_USERNAME") {
            self.postgres.username = v;
        }
        if let Some(v) = lookup("POSTGRES_PASSWORD") {
            self.postgres.password = v;
        }
        if let Some(v) = lookup("POSTGRES_MAX_CONNECTIONS") {
            self.postgres.max_connections = parse_value("POSTGRES_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.postgres.url = Some(v);
        }
        Ok(())
    }

    /// Resolve the listen address (host names such as `localhost` included).
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        use std::net::ToSocketAddrs;

        let raw = format!("{}:{}", self.listen.host, self.listen.port);
        raw.to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or(ConfigError::ListenAddr(raw))
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
