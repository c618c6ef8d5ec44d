//! HTTP routes for the checkout service.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers;
use crate::models::OrderRequest;
use crate::services::capture_context::CaptureContextService;

/// Hard cap on any single request. Sits above the per-checkout deadline
/// so the handler's own timeout fires first under normal configuration.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,
    /// Capture-context orchestration.
    pub capture_context: CaptureContextService,
    /// Order submitted to the gateway for every checkout.
    pub order_request: OrderRequest,
}

/// Build the service router.
#[must_use]
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route("/v1/checkout", get(handlers::checkout))
        .with_state(state)
        // Layers apply outside-in: tracing wraps the timeout so requests
        // that time out are still logged.
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::Request;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::services::gateway::GatewayClient;
    use crate::services::signature::RequestSigner;
    use crate::token::keys::PublicKeyClient;
    use crate::token::verify::TokenVerifier;

    fn test_state() -> Arc<AppState> {
        let mut vars = HashMap::new();
        vars.insert("CHECKOUT_MERCHANT_ID".to_string(), "testrest".to_string());
        vars.insert(
            "CHECKOUT_MERCHANT_KEY_ID".to_string(),
            "key-id-01".to_string(),
        );
        vars.insert(
            "CHECKOUT_MERCHANT_SECRET_KEY".to_string(),
            STANDARD.encode(b"merchant shared secret"),
        );
        let config = Config::from_vars(&vars).unwrap();

        let signer = RequestSigner::new(
            config.merchant_id.clone(),
            config.merchant_key_id.clone(),
            config.merchant_secret_key.clone(),
        );
        let gateway = GatewayClient::with_base_url("http://127.0.0.1:1", signer).unwrap();
        let keys = PublicKeyClient::with_base_url("http://127.0.0.1:1").unwrap();
        let verifier = TokenVerifier::new(keys, config.verification_leeway_seconds);

        Arc::new(AppState {
            config,
            capture_context: CaptureContextService::new(gateway, verifier),
            order_request: OrderRequest::new(json!({})),
        })
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_router_serves_health() {
        let app = build_routes(test_state());

        let request = Request::builder()
            .method("GET")
            .uri("/v1/health")
            .body(Body::empty())
            .expect("request builder should succeed");

        let response = app.oneshot(request).await.expect("request should succeed");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_rejects_unknown_route() {
        let app = build_routes(test_state());

        let request = Request::builder()
            .method("GET")
            .uri("/v1/nonexistent")
            .body(Body::empty())
            .expect("request builder should succeed");

        let response = app.oneshot(request).await.expect("request should succeed");
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
