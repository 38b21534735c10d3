//! Configuration management for PaperCompass services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Account store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Paper data locations
    #[serde(default)]
    pub data: DataConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Natural-language keyword expansion
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Root directory holding one sub-directory of JSON files per conference
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding the precomputed key-field catalogs
    #[serde(default = "default_key_infos_dir")]
    pub key_infos_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT secret for session token signing
    pub jwt_secret: Option<String>,

    /// JWT expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,

    /// Username of the administrator seeded into a fresh store
    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Password of the administrator seeded into a fresh store
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpansionConfig {
    /// Whether searches may call the remote endpoint at all
    #[serde(default = "default_expansion_enabled")]
    pub enabled: bool,

    /// Text-generation endpoint used to turn free text into keywords
    #[serde(default = "default_expansion_endpoint")]
    pub endpoint: String,

    /// API credential sent in the Authorization header
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_expansion_timeout")]
    pub timeout_secs: u64,

    /// Maximum tokens requested from the endpoint
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "papercompass_search=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_database_url() -> String { "sqlite://user_data.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_data_dir() -> PathBuf { PathBuf::from("data") }
fn default_key_infos_dir() -> PathBuf { PathBuf::from("key_infos") }
fn default_jwt_expiration() -> u64 { 86_400 }
fn default_admin_username() -> String { crate::DEFAULT_ADMIN_USERNAME.to_string() }
fn default_admin_password() -> String { crate::DEFAULT_ADMIN_PASSWORD.to_string() }
fn default_expansion_endpoint() -> String {
    "https://aip.baidubce.com/rpc/2.0/ai_custom/v1/wenxin".to_string()
}
fn default_expansion_enabled() -> bool { true }
fn default_expansion_timeout() -> u64 { 20 }
fn default_max_tokens() -> u32 { 150 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "papercompass".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_infos_dir: default_key_infos_dir(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_expiration_secs: default_jwt_expiration(),
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: default_expansion_enabled(),
            endpoint: default_expansion_endpoint(),
            api_key: None,
            timeout_secs: default_expansion_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get the expansion call timeout as Duration
    pub fn expansion_timeout(&self) -> Duration {
        Duration::from_secs(self.expansion.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            data: DataConfig::default(),
            auth: AuthConfig::default(),
            expansion: ExpansionConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.admin_username, "admin");
        assert_eq!(config.expansion.max_tokens, 150);
        assert_eq!(config.expansion_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_file_fills_missing_sections() {
        let toml = "[data]\ndata_dir = \"/srv/papers\"\n\n[server]\nport = 9000";
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.data.data_dir, PathBuf::from("/srv/papers"));
        assert_eq!(config.data.key_infos_dir, PathBuf::from("key_infos"));
        assert!(config.auth.jwt_secret.is_none());
    }
}
