// Configuration module entry point
// Manages application configuration and per-process runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, DatabaseConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    StorageBackend, TEST_ENVIRONMENT,
};

/// Default config file (without extension), overridable with `BOARD_CONFIG`
const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `config.toml` (optional) and the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var("BOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Load configuration, resolving the well-known variables through `lookup`
    ///
    /// Precedence, lowest first: defaults, config file, `BOARD__*` variables,
    /// then `HOST`, `PORT`, `DB_CONNECTION_STRING` and `NODE_ENV`/`APP_ENV`.
    pub fn load_with(
        config_path: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let port = lookup("PORT")
            .map(|p| p.trim().parse::<u16>())
            .transpose()
            .map_err(|e| config::ConfigError::Message(format!("Invalid PORT: {e}")))?;
        let environment = lookup("NODE_ENV").or_else(|| lookup("APP_ENV"));

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("BOARD")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.backend", "mongodb")?
            .set_default("database.name", "message_board")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "dev")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "message-board/0.1")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 102_400)? // 100KB
            .set_default("http.strict_status_codes", false)?
            .set_default("environment", "development")?
            .set_override_option("server.host", lookup("HOST"))?
            .set_override_option("server.port", port.map(i64::from))?
            .set_override_option("database.connection_string", lookup("DB_CONNECTION_STRING"))?
            .set_override_option("environment", environment)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Configuration for unit tests: test environment, in-memory storage
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let mut cfg = Config::load_with("does-not-exist/message-board-test-config", |key| {
        (key == "NODE_ENV").then(|| TEST_ENVIRONMENT.to_string())
    })
    .expect("test configuration");
    cfg.database.backend = StorageBackend::Memory;
    cfg
}
