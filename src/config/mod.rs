//! Application configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing file is not an error. The file path
//! can be overridden with `LEDGER_CONFIG`; `DATABASE_URL` overrides the
//! configured database (see [`database::get_database_url`]).

/// Database configuration and connection management
pub mod database;

use crate::core::account::AccountId;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default freight per unit applied when a sale omits it, in cents.
pub const DEFAULT_UNIT_FREIGHT: i64 = 500;

/// Whole `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database URL; `DATABASE_URL` wins when set
    #[serde(default)]
    pub database_url: Option<String>,
    /// Engine behaviour
    #[serde(default)]
    pub ledger: LedgerSettings,
    /// Display-name overrides for the fixed accounts
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// Engine settings under `[ledger]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LedgerSettings {
    /// Freight per unit used when a sale does not specify one
    #[serde(default = "default_unit_freight")]
    pub default_unit_freight: i64,
    /// When false, withdrawals that would take a balance below zero are rejected
    #[serde(default)]
    pub allow_overdraft: bool,
}

const fn default_unit_freight() -> i64 {
    DEFAULT_UNIT_FREIGHT
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_unit_freight: DEFAULT_UNIT_FREIGHT,
            allow_overdraft: false,
        }
    }
}

/// One `[[accounts]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Fixed account identifier
    pub id: AccountId,
    /// Display name to seed with
    pub name: String,
}

impl AppConfig {
    /// Display name for `account`, honouring overrides.
    #[must_use]
    pub fn account_name(&self, account: AccountId) -> String {
        self.accounts
            .iter()
            .find(|entry| entry.id == account)
            .map_or_else(|| account.display_name().to_string(), |entry| entry.name.clone())
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.ledger.default_unit_freight < 0 {
        return Err(Error::Config {
            message: "ledger.default_unit_freight cannot be negative".to_string(),
        });
    }

    Ok(config)
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or a value is out of range.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads `LEDGER_CONFIG` (default `./config.toml`), falling back to defaults when the
/// file does not exist.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        let config = load_config(&path)?;
        tracing::info!("Loaded configuration from {}", path);
        Ok(config)
    } else {
        tracing::info!("No configuration file at {}, using defaults", path);
        Ok(AppConfig::default())
    }
}
