//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Ledger aggregation settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Account code generation settings.
    #[serde(default)]
    pub accounts: AccountCodeConfig,
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

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Ledger aggregation settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LedgerConfig {
    /// Maximum absolute difference between total debits and credits that
    /// still counts as balanced.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: default_balance_tolerance(),
        }
    }
}

/// Account code generation settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AccountCodeConfig {
    /// Total digits of a root account code, type prefix included.
    #[serde(default = "default_root_code_width")]
    pub root_code_width: usize,
    /// Digits appended to the parent code for each subaccount level.
    #[serde(default = "default_child_suffix_width")]
    pub child_suffix_width: usize,
    /// Attempts made before giving up on a colliding code.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
}

fn default_root_code_width() -> usize {
    7
}

fn default_child_suffix_width() -> usize {
    2
}

fn default_max_code_attempts() -> u32 {
    5
}

impl Default for AccountCodeConfig {
    fn default() -> Self {
        Self {
            root_code_width: default_root_code_width(),
            child_suffix_width: default_child_suffix_width(),
            max_code_attempts: default_max_code_attempts(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones overriding earlier ones: `config/default`,
    /// `config/{RUN_MODE}`, then `FISCUS__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FISCUS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
