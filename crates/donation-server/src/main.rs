//! Donation HTTP Server
//!
//! Axum-based server that starts TrueLayer hosted payments for the donate
//! button and serves the WASM frontend.

mod app;
mod config;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donation_payments::{TrueLayerClient, WebhookHandler};

use crate::app::build_router;
use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let missing = config.provider.missing();
    if missing.is_empty() {
        tracing::info!(currency = %config.provider.currency, "✓ TrueLayer configured");
    } else {
        tracing::warn!("⚠ TrueLayer not fully configured - donations will fail");
        for name in missing {
            tracing::warn!("  Missing {}", name);
        }
    }

    tracing::info!(jkus = ?config.provider.webhook_jkus, "Webhook key sets allowed");

    // One connection pool for provider calls and JWKS fetches
    let http = reqwest::Client::new();
    let webhooks = WebhookHandler::truelayer(http.clone(), config.provider.webhook_jkus.clone());
    let payments = Arc::new(TrueLayerClient::with_http(http, config.provider.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState {
        config: Arc::new(config),
        payments,
        webhooks,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://localhost:{}", addr.port());
    tracing::info!("Endpoints:");
    tracing::info!("  POST /api/create-payment - Start a donation");
    tracing::info!("  POST /api/webhook        - Provider notifications");
    tracing::info!("  GET  /api/health         - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
