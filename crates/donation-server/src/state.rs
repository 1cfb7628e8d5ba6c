//! Application State

use std::sync::Arc;

use donation_payments::{PaymentProvider, WebhookHandler};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read-only configuration
    pub config: Arc<ServerConfig>,

    /// Creates hosted payment sessions (TrueLayer in production)
    pub payments: Arc<dyn PaymentProvider>,

    /// Verifies and logs provider notifications
    pub webhooks: WebhookHandler,
}
