//! Configuration management
//!
//! Configuration comes from a `config.yml` file, with `GALLERIA_*`
//! environment variables overriding individual values. Missing files and
//! missing keys fall back to sensible defaults, so a bare binary starts.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Payment provider configuration
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/galleria.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// Payment provider configuration.
///
/// The secret key authenticates API calls to the provider; the webhook
/// secret signs inbound events. Both default to placeholder values that the
/// deployment must override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Provider API base URL
    #[serde(default = "default_payment_base_url")]
    pub base_url: String,
    /// API secret key
    #[serde(default)]
    pub secret_key: String,
    /// Webhook signing secret
    #[serde(default)]
    pub webhook_secret: String,
    /// Where the provider redirects the buyer after payment
    #[serde(default = "default_success_url")]
    pub success_url: String,
    /// Where the provider redirects the buyer after abandoning checkout
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: default_payment_base_url(),
            secret_key: String::new(),
            webhook_secret: String::new(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

fn default_payment_base_url() -> String {
    "https://api.payment.example.com".to_string()
}

fn default_success_url() -> String {
    "http://localhost:3000/checkout/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/checkout/cancel".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults; invalid YAML is an
    /// error with the offending location.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides.
    ///
    /// Recognized variables:
    /// - GALLERIA_SERVER_HOST / GALLERIA_SERVER_PORT / GALLERIA_SERVER_CORS_ORIGIN
    /// - GALLERIA_DATABASE_URL / GALLERIA_DATABASE_MAX_CONNECTIONS
    /// - GALLERIA_PAYMENT_BASE_URL / GALLERIA_PAYMENT_SECRET_KEY
    /// - GALLERIA_PAYMENT_WEBHOOK_SECRET
    /// - GALLERIA_PAYMENT_SUCCESS_URL / GALLERIA_PAYMENT_CANCEL_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("GALLERIA_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GALLERIA_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("GALLERIA_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(url) = std::env::var("GALLERIA_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("GALLERIA_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        if let Ok(base_url) = std::env::var("GALLERIA_PAYMENT_BASE_URL") {
            self.payment.base_url = base_url;
        }
        if let Ok(secret_key) = std::env::var("GALLERIA_PAYMENT_SECRET_KEY") {
            self.payment.secret_key = secret_key;
        }
        if let Ok(webhook_secret) = std::env::var("GALLERIA_PAYMENT_WEBHOOK_SECRET") {
            self.payment.webhook_secret = webhook_secret;
        }
        if let Ok(success_url) = std::env::var("GALLERIA_PAYMENT_SUCCESS_URL") {
            self.payment.success_url = success_url;
        }
        if let Ok(cancel_url) = std::env::var("GALLERIA_PAYMENT_CANCEL_URL") {
            self.payment.cancel_url = cancel_url;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for tests that touch environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
