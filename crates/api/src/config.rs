//! Server configuration

use ::config::{Config, ConfigError, Environment, Map};
use serde::Deserialize;
use tracing::Level;

/// Address the server binds to; always every interface
pub const BIND_HOST: &str = "0.0.0.0";

/// Server configuration, read from environment variables over defaults
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listening TCP port (`PORT`)
    pub port: u16,

    /// Request body limit for uploads in bytes (`MAX_UPLOAD_BYTES`)
    pub max_upload_bytes: usize,

    /// Tracing max level (`LOG_LEVEL`)
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_upload_bytes: 10 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(Environment::default())
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::default().source(Some(vars)))
    }

    fn build(env: Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("log_level", defaults.log_level)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// `host:port` listen address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", BIND_HOST, self.port)
    }

    /// Parsed tracing level; unknown names fall back to INFO
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}
