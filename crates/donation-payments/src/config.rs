//! Provider Configuration
//!
//! Settings are read once at startup into an immutable [`ProviderConfig`].
//! Required values are kept optional here and checked when a payment is
//! attempted, so a half-configured server still boots and reports exactly
//! which variable is missing.

use crate::error::{PaymentError, Result};

pub const CLIENT_ID: &str = "TRUELAYER_CLIENT_ID";
pub const CLIENT_SECRET: &str = "TRUELAYER_CLIENT_SECRET";
pub const AUTH_BASE: &str = "TRUELAYER_AUTH_BASE";
pub const API_BASE: &str = "TRUELAYER_API_BASE";
pub const HPP_BASE: &str = "TRUELAYER_HPP_BASE";
pub const MERCHANT_ACCOUNT_ID: &str = "TRUELAYER_MERCHANT_ACCOUNT_ID";
pub const REDIRECT_URI: &str = "TRUELAYER_REDIRECT_URI";
pub const CURRENCY: &str = "TRUELAYER_CURRENCY";
pub const WEBHOOK_JKUS: &str = "TRUELAYER_WEBHOOK_JKUS";

/// Currency used when none is configured
pub const DEFAULT_CURRENCY: &str = "GBP";

/// Key sets TrueLayer signs webhooks with, production and sandbox
pub const DEFAULT_WEBHOOK_JKUS: [&str; 2] = [
    "https://webhooks.truelayer.com/.well-known/jwks",
    "https://webhooks.truelayer-sandbox.com/.well-known/jwks",
];

/// TrueLayer connection settings
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_base: Option<String>,
    pub api_base: Option<String>,
    /// Hosted payment page, used when the provider returns only an id/token pair
    pub hpp_base: Option<String>,
    pub merchant_account_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub currency: String,
    /// Only `jku` values in this list are fetched when verifying webhooks
    pub webhook_jkus: Vec<String>,
}

impl ProviderConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            client_id: get(CLIENT_ID),
            client_secret: get(CLIENT_SECRET),
            auth_base: get(AUTH_BASE).map(trim_base),
            api_base: get(API_BASE).map(trim_base),
            hpp_base: get(HPP_BASE),
            merchant_account_id: get(MERCHANT_ACCOUNT_ID),
            redirect_uri: get(REDIRECT_URI),
            currency: get(CURRENCY).unwrap_or_else(|| DEFAULT_CURRENCY.into()),
            webhook_jkus: get(WEBHOOK_JKUS).map_or_else(
                || DEFAULT_WEBHOOK_JKUS.iter().map(ToString::to_string).collect(),
                |list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|jku| !jku.is_empty())
                        .map(ToString::to_string)
                        .collect()
                },
            ),
        }
    }

    /// Names of required variables that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (CLIENT_ID, &self.client_id),
            (CLIENT_SECRET, &self.client_secret),
            (AUTH_BASE, &self.auth_base),
            (API_BASE, &self.api_base),
            (MERCHANT_ACCOUNT_ID, &self.merchant_account_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Token endpoint settings, checked in the order the grant needs them
    pub(crate) fn token_settings(&self) -> Result<TokenSettings<'_>> {
        Ok(TokenSettings {
            client_id: require(CLIENT_ID, &self.client_id)?,
            client_secret: require(CLIENT_SECRET, &self.client_secret)?,
            auth_base: require(AUTH_BASE, &self.auth_base)?,
        })
    }

    /// Payment endpoint settings
    pub(crate) fn payment_settings(&self) -> Result<PaymentSettings<'_>> {
        Ok(PaymentSettings {
            api_base: require(API_BASE, &self.api_base)?,
            merchant_account_id: require(MERCHANT_ACCOUNT_ID, &self.merchant_account_id)?,
        })
    }
}

pub(crate) struct TokenSettings<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub auth_base: &'a str,
}

pub(crate) struct PaymentSettings<'a> {
    pub api_base: &'a str,
    pub merchant_account_id: &'a str,
}

fn require<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str> {
    value.as_deref().ok_or(PaymentError::MissingConfig(name))
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ProviderConfig::from_lookup(lookup(&[]));
        assert_eq!(config.currency, "GBP");
        assert!(config.hpp_base.is_none());
        assert_eq!(config.missing().len(), 5);
        assert_eq!(config.webhook_jkus, DEFAULT_WEBHOOK_JKUS);
    }

    #[test]
    fn test_webhook_jkus_override() {
        let config = ProviderConfig::from_lookup(lookup(&[(
            WEBHOOK_JKUS,
            "https://keys.example/jwks, ,https://other.example/jwks",
        )]));
        assert_eq!(
            config.webhook_jkus,
            ["https://keys.example/jwks", "https://other.example/jwks"]
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = ProviderConfig::from_lookup(lookup(&[(CLIENT_ID, "  "), (CURRENCY, "")]));
        assert!(config.client_id.is_none());
        assert_eq!(config.currency, "GBP");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (AUTH_BASE, "https://auth.truelayer-sandbox.com/"),
            (API_BASE, "https://api.truelayer-sandbox.com/v3/"),
        ]));
        assert_eq!(config.auth_base.as_deref(), Some("https://auth.truelayer-sandbox.com"));
        assert_eq!(config.api_base.as_deref(), Some("https://api.truelayer-sandbox.com/v3"));
    }

    #[test]
    fn test_token_settings_reports_first_missing() {
        let config = ProviderConfig::from_lookup(lookup(&[(CLIENT_ID, "id")]));
        let err = config.token_settings().err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Missing required env var: TRUELAYER_CLIENT_SECRET"));
    }

    #[test]
    fn test_payment_settings() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (API_BASE, "https://api.example"),
            (MERCHANT_ACCOUNT_ID, "ma_1"),
            (CURRENCY, "EUR"),
        ]));
        let settings = config.payment_settings().unwrap();
        assert_eq!(settings.api_base, "https://api.example");
        assert_eq!(settings.merchant_account_id, "ma_1");
        assert_eq!(config.currency, "EUR");
    }
}
