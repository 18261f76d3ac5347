//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Payment gateway configuration.
    #[serde(default)]
    pub paymongo: PayMongoConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// PayMongo gateway configuration.
///
/// When `secret_key` is empty the server runs with a no-op gateway and
/// reimbursement initiation surfaces a configuration error.
#[derive(Debug, Clone, Deserialize)]
pub struct PayMongoConfig {
    /// API secret key (`sk_test_...` / `sk_live_...`).
    #[serde(default)]
    pub secret_key: String,
    /// Webhook signing secret; empty disables signature verification.
    #[serde(default)]
    pub webhook_secret: String,
    /// API base URL.
    #[serde(default = "default_paymongo_base_url")]
    pub base_url: String,
    /// Redirect URL after a successful checkout.
    #[serde(default = "default_success_url")]
    pub success_url: String,
    /// Redirect URL after a cancelled checkout.
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

fn default_paymongo_base_url() -> String {
    "https://api.paymongo.com/v1".to_string()
}

fn default_success_url() -> String {
    "http://localhost:8080/reimbursement/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:8080/reimbursement/cancel".to_string()
}

impl Default for PayMongoConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            webhook_secret: String::new(),
            base_url: default_paymongo_base_url(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

impl PayMongoConfig {
    /// Returns true when a secret key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.secret_key.trim().is_empty()
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CEMS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
