//! HTTP Handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use donation_payments::{AmountMinor, PaymentError, WebhookRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub payment_url: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".into() })
}

/// Start a donation and hand back the provider's payment page
pub async fn create_payment(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreatePaymentResponse>, PaymentError> {
    let amount = requested_amount(&body, state.config.default_amount).inspect_err(|_| {
        tracing::debug!(body = %String::from_utf8_lossy(&body), "Rejected donation amount");
    })?;

    let session = state.payments.create_payment(amount).await.inspect_err(|e| {
        tracing::error!(provider = state.payments.name(), error = %e, "Payment creation failed");
    })?;

    Ok(Json(CreatePaymentResponse {
        payment_url: session.payment_url,
    }))
}

/// Provider webhook receiver
pub async fn webhook(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, PaymentError> {
    let request = WebhookRequest {
        path: uri.path(),
        headers: headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes()))
            .collect(),
        body: &body,
    };

    let event = state.webhooks.parse_event(&request).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Webhook rejected");
    })?;

    state.webhooks.handle(&event);
    Ok(StatusCode::OK)
}

/// An empty body or a body without `amount_minor` means "use the default".
fn requested_amount(body: &[u8], fallback: AmountMinor) -> Result<AmountMinor, PaymentError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(fallback);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| PaymentError::InvalidAmount)?;
    AmountMinor::resolve(value.get("amount_minor"), fallback)
}
