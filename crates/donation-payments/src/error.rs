//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Requested amount is not a positive integer
    #[error("Invalid amount_minor")]
    InvalidAmount,

    /// A required setting is absent from the environment
    #[error("Missing required env var: {0}")]
    MissingConfig(&'static str),

    /// Token endpoint answered with a non-success status
    #[error("Token error: {status} {body}")]
    Token { status: u16, body: String },

    /// Payment creation answered with a non-success status
    #[error("Payment error: {status} {body}")]
    Payment { status: u16, body: serde_json::Value },

    /// Provider accepted the payment but gave us nowhere to send the donor
    #[error("Missing payment_url from TrueLayer response")]
    MissingPaymentUrl { raw: serde_json::Value },

    /// Network or decoding failure talking to the provider
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),
}

impl PaymentError {
    /// True for errors caused by the caller rather than by us or the provider
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentError::InvalidAmount
                | PaymentError::WebhookSignature(_)
                | PaymentError::WebhookParse(_)
        )
    }

    /// Provider payload worth returning to the caller for diagnosis
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            PaymentError::MissingPaymentUrl { raw } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(feature = "axum-handlers")]
mod response {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use serde::Serialize;

    use super::PaymentError;

    /// JSON error body: `{ error, details? }`
    #[derive(Debug, Serialize)]
    pub struct ErrorBody {
        pub error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub details: Option<serde_json::Value>,
    }

    impl PaymentError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for PaymentError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            let body = ErrorBody {
                error: self.to_string(),
                details: self.details().cloned(),
            };
            (status, Json(body)).into_response()
        }
    }
}

#[cfg(feature = "axum-handlers")]
pub use response::ErrorBody;
