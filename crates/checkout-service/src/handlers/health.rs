//! Health check handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::routes::AppState;

/// Liveness endpoint. Reports the configured gateway host so an operator
/// can tell at a glance which environment the service points at.
#[instrument(skip_all, name = "checkout.health.check")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "checkout-service".to_string(),
        gateway_host: state.config.gateway_host.clone(),
    })
}

// ============================================================================
// Tests
// ============================================================================
