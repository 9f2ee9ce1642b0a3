//! Configuration module for tcpchat.

use serde::Deserialize;
use std::path::Path;

use crate::{ChatError, Result};

/// Usage line printed when the command line cannot be parsed.
pub const USAGE: &str = "[USAGE]: tcpchat [port]";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of registered chat users.
    #[serde(default = "default_max_users")]
    pub max_users: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8989
}

fn default_max_users() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_users: default_max_users(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace / debug / info / warn / error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/tcpchat.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ChatError::Config(e.to_string()))
    }
}

/// Parse the optional `[port]` positional argument.
///
/// The CLI surface is `tcpchat [port]`: no arguments uses the configured
/// port, one argument overrides it, anything else is a usage error.
pub fn port_from_args(args: &[String]) -> Result<Option<u16>> {
    match args {
        [] => Ok(None),
        [port] => port
            .parse::<u16>()
            .map(Some)
            .map_err(|_| ChatError::Config(format!("invalid port: {port}"))),
        _ => Err(ChatError::Config("too many arguments".to_string())),
    }
}
