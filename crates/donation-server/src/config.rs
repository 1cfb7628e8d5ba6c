//! Server Configuration

use std::path::PathBuf;

use donation_payments::{AmountMinor, ProviderConfig};
use thiserror::Error;

pub const PORT: &str = "PORT";
pub const DEFAULT_DONATION_MINOR: &str = "DEFAULT_DONATION_MINOR";
pub const STATIC_DIR: &str = "STATIC_DIR";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "static";

/// Settings that must parse for the server to start
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Immutable process configuration, built once in `main`
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
    /// Used when a request carries no `amount_minor`
    pub default_amount: AmountMinor,
    pub provider: ProviderConfig,
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get(PORT) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT,
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let default_amount = match get(DEFAULT_DONATION_MINOR) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: DEFAULT_DONATION_MINOR,
                expected: "a positive integer",
                value,
            })?,
            None => AmountMinor::default(),
        };

        Ok(Self {
            port,
            static_dir: get(STATIC_DIR)
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.into())
                .into(),
            default_amount,
            provider: ProviderConfig::from_lookup(&lookup),
        })
    }
}
