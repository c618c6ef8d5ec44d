//! Checkout page handler.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use crate::errors::CheckoutError;
use crate::models::CheckoutResponse;
use crate::routes::AppState;

/// Serve everything the checkout page needs: a verified capture context,
/// the client library it should load, and the order total to display.
///
/// The orchestration runs under the configured deadline, so a stalled
/// gateway surfaces as a timeout instead of an open-ended hang.
#[instrument(skip_all, name = "checkout.page")]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckoutResponse>, CheckoutError> {
    let deadline = Duration::from_secs(state.config.checkout_deadline_seconds);

    let context = tokio::time::timeout(
        deadline,
        state.capture_context.obtain(&state.order_request),
    )
    .await
    .map_err(|_| {
        CheckoutError::Cancelled(format!(
            "checkout deadline of {}s elapsed",
            state.config.checkout_deadline_seconds
        ))
    })??;

    Ok(Json(CheckoutResponse {
        capture_context: context.token,
        client_library: context.claims.client_library,
        client_library_integrity: context.claims.client_library_integrity,
        total_amount: context.display_amount,
    }))
}

// ============================================================================
// Tests
// ============================================================================
