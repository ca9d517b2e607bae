// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Environment marker that turns request logging off
pub const TEST_ENVIRONMENT: &str = "test";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    /// Deployment environment (`NODE_ENV`)
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_environment() -> String {
    "development".to_string()
}

impl Config {
    pub fn is_test(&self) -> bool {
        self.environment.eq_ignore_ascii_case(TEST_ENVIRONMENT)
    }

    /// Whether each request should produce an access log line
    pub fn access_log_enabled(&self) -> bool {
        self.logging.access_log && !self.is_test()
    }
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Storage engine selection
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Engine address (`DB_CONNECTION_STRING`)
    #[serde(default)]
    pub connection_string: Option<String>,
    /// Database name used when the connection string does not pick one
    pub name: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (dev, combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "dev".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
    /// Map error kinds to distinct status codes instead of a flat 400
    #[serde(default)]
    pub strict_status_codes: bool,
}
