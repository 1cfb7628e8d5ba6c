//! # donation-payments
//!
//! Hosted bank-transfer donations through TrueLayer.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Your Site  │────▶│  TrueLayer HPP  │────▶│  Your Site      │
//! │  (donate)   │     │  / bank auth    │     │  (redirect_uri) │
//! └─────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Creating a session takes two calls: a client-credentials token grant, then
//! `POST /payments`. The redirect URL comes from the payment response, or is
//! built from the hosted payment page base when only an id/token pair is
//! returned.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use donation_payments::{AmountMinor, PaymentProvider, ProviderConfig, TrueLayerClient};
//!
//! let client = TrueLayerClient::new(ProviderConfig::from_env());
//! let session = client.create_payment(AmountMinor::new(1000)?).await?;
//!
//! // Redirect donor to: session.payment_url
//! ```

mod client;
pub mod config;
mod error;
mod payment;
mod provider;
mod webhook;

pub use client::{AccessToken, TrueLayerClient};
pub use config::ProviderConfig;
#[cfg(feature = "axum-handlers")]
pub use error::ErrorBody;
pub use error::{PaymentError, Result};
pub use payment::{
    session_from_response, AmountMinor, CreatePaymentRequest, PaymentSession,
    DEFAULT_AMOUNT_MINOR,
};
pub use provider::PaymentProvider;
pub use webhook::{
    SignatureVerifier, TlSignatureVerifier, WebhookEvent, WebhookHandler, WebhookRequest,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
