//! Checkout service entry point.

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod token;

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::models::OrderRequest;
use crate::routes::{build_routes, AppState};
use crate::services::capture_context::CaptureContextService;
use crate::services::gateway::GatewayClient;
use crate::services::signature::RequestSigner;
use crate::token::keys::PublicKeyClient;
use crate::token::verify::TokenVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkout_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(target: "checkout.startup", config = ?config, "configuration loaded");

    // The order fixture is the one thing every checkout depends on.
    // Refuse to start without it rather than serve guaranteed failures.
    let order_request = OrderRequest::from_json_file(Path::new(&config.order_request_path))?;
    tracing::info!(
        target: "checkout.startup",
        path = %config.order_request_path,
        "order request loaded"
    );

    let signer = RequestSigner::new(
        config.merchant_id.clone(),
        config.merchant_key_id.clone(),
        config.merchant_secret_key.clone(),
    );
    let gateway = GatewayClient::new(&config.gateway_host, signer)?;
    let keys = PublicKeyClient::new(&config.gateway_host)?;
    let verifier = TokenVerifier::new(keys, config.verification_leeway_seconds);
    let capture_context = CaptureContextService::new(gateway, verifier);

    let state = Arc::new(AppState {
        config: config.clone(),
        capture_context,
        order_request,
    });

    let app = build_routes(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(target: "checkout.startup", address = %config.bind_address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for ctrl-c or SIGTERM, then give in-flight requests time to drain.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(target: "checkout.shutdown", %error, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(target: "checkout.shutdown", %error, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    let drain_seconds = std::env::var("CHECKOUT_DRAIN_SECONDS")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(0);
    if drain_seconds > 0 {
        tracing::info!(target: "checkout.shutdown", drain_seconds, "draining in-flight requests");
        tokio::time::sleep(std::time::Duration::from_secs(drain_seconds)).await;
    }

    tracing::info!(target: "checkout.shutdown", "shutting down");
}
