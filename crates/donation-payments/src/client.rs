//! TrueLayer Client
//!
//! Two calls per donation, strictly in order:
//!
//! 1. client-credentials grant against `{auth_base}/connect/token`
//! 2. `POST {api_base}/payments` with the fresh bearer token
//!
//! The first failure ends the pipeline. Nothing is cached between donations.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{PaymentError, Result};
use crate::payment::{session_from_response, AmountMinor, CreatePaymentRequest, PaymentSession};
use crate::provider::PaymentProvider;

/// Scope requested for every token
const TOKEN_SCOPE: &str = "payments";

/// Bearer token from the client-credentials grant
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// TrueLayer payments API client
#[derive(Clone)]
pub struct TrueLayerClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl TrueLayerClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http(reqwest::Client::new(), config)
    }

    /// Reuse an existing connection pool
    pub fn with_http(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }

    /// Exchange client credentials for a bearer token
    pub async fn access_token(&self) -> Result<AccessToken> {
        let settings = self.config.token_settings()?;

        let response = self
            .http
            .post(format!("{}/connect/token", settings.auth_base))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", settings.client_id),
                ("client_secret", settings.client_secret),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::warn!(status = status.as_u16(), "Token request rejected");
            return Err(PaymentError::Token {
                status: status.as_u16(),
                body,
            });
        }

        let token: AccessToken = response.json().await?;
        tracing::debug!(expires_in = ?token.expires_in, "Obtained access token");
        Ok(token)
    }

    /// Create a payment and resolve where the donor should go next
    pub async fn create_donation(&self, amount: AmountMinor) -> Result<PaymentSession> {
        let settings = self.config.payment_settings()?;
        let token = self.access_token().await?;

        let request = CreatePaymentRequest::donation(
            amount,
            &self.config.currency,
            settings.merchant_account_id,
            self.config.redirect_uri.as_deref(),
        );

        let response = self
            .http
            .post(format!("{}/payments", settings.api_base))
            .bearer_auth(token.secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let raw = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Payment creation rejected");
            return Err(PaymentError::Payment {
                status: status.as_u16(),
                body: raw,
            });
        }

        let session = session_from_response(raw, self.config.hpp_base.as_deref())?;
        tracing::info!(
            payment_id = ?session.id,
            amount = %amount,
            currency = %self.config.currency,
            "Created payment"
        );
        Ok(session)
    }
}

#[async_trait]
impl PaymentProvider for TrueLayerClient {
    async fn create_payment(&self, amount: AmountMinor) -> Result<PaymentSession> {
        self.create_donation(amount).await
    }

    fn name(&self) -> &str {
        "TrueLayer"
    }
}
