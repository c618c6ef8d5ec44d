//! Test server harness for E2E testing
//!
//! Provides TestCheckoutServer for spawning real checkout server instances
//! in tests, backed by a wiremock stand-in for the payment gateway.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use checkout_service::config::Config;
use checkout_service::models::OrderRequest;
use checkout_service::routes::{build_routes, AppState};
use checkout_service::services::{CaptureContextService, GatewayClient, RequestSigner};
use checkout_service::token::{PublicKeyClient, TokenVerifier};
use serde_json::json;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::crypto_fixtures::TestRsaKey;

/// Knobs for spawning a test server with non-default behavior.
pub struct HarnessOptions {
    /// Order body submitted to the gateway on every checkout.
    pub order_body: serde_json::Value,
    /// Per-checkout deadline in seconds.
    pub deadline_seconds: u64,
    /// Leeway in seconds for token time-claim checks.
    pub leeway_seconds: u64,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        HarnessOptions {
            order_body: json!({
                "clientVersion": "0.23",
                "targetOrigins": ["https://storefront.example.com"],
                "allowedCardNetworks": ["VISA", "MASTERCARD"],
                "allowedPaymentTypes": ["PANENTRY"],
                "orderInformation": {
                    "amountDetails": {
                        "totalAmount": "42.50",
                        "currency": "USD"
                    }
                }
            }),
            deadline_seconds: 15,
            leeway_seconds: 20,
        }
    }
}

/// Test harness for spawning the checkout server in E2E tests
///
/// The spawned server talks to a wiremock MockServer that plays both
/// gateway roles: the capture-context endpoint and the public-key
/// endpoint. Tests mount expectations on it and sign tokens with the
/// harness key so the server's verification succeeds.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_checkout_e2e() -> Result<()> {
///     let server = TestCheckoutServer::spawn().await?;
///     server.mount_public_key().await;
///
///     let token = CaptureContextTokenBuilder::new().sign(server.signing_key())?;
///     server.mount_capture_context(201, &token).await;
///
///     let response = reqwest::get(&format!("{}/v1/checkout", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestCheckoutServer {
    addr: SocketAddr,
    gateway: MockServer,
    signing_key: TestRsaKey,
    _handle: JoinHandle<()>,
}

impl TestCheckoutServer {
    /// Spawn a test server with default options.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(HarnessOptions::default()).await
    }

    /// Spawn a new test server instance against a fresh mock gateway
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Point both gateway clients at a fresh wiremock instance
    /// - Generate an RSA signing key for test tokens
    /// - Start the HTTP server in the background
    ///
    /// # Arguments
    /// * `options` - Order body and timing knobs for this instance
    ///
    /// # Returns
    /// * `Ok(TestCheckoutServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn_with(options: HarnessOptions) -> Result<Self, anyhow::Error> {
        let gateway = MockServer::start().await;

        let signing_key = TestRsaKey::generate("test-rsa-key-01")
            .map_err(|e| anyhow::anyhow!("Failed to generate signing key: {}", e))?;

        // Build configuration
        let mut vars = HashMap::new();
        vars.insert("CHECKOUT_MERCHANT_ID".to_string(), "testrest".to_string());
        vars.insert(
            "CHECKOUT_MERCHANT_KEY_ID".to_string(),
            "test-merchant-key".to_string(),
        );
        vars.insert(
            "CHECKOUT_MERCHANT_SECRET_KEY".to_string(),
            STANDARD.encode(b"test merchant secret"),
        );
        vars.insert(
            "CHECKOUT_VERIFICATION_LEEWAY_SECONDS".to_string(),
            options.leeway_seconds.to_string(),
        );
        vars.insert(
            "CHECKOUT_DEADLINE_SECONDS".to_string(),
            options.deadline_seconds.to_string(),
        );
        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to build test config: {}", e))?;

        // Wire the service against the mock gateway
        let signer = RequestSigner::new(
            config.merchant_id.clone(),
            config.merchant_key_id.clone(),
            config.merchant_secret_key.clone(),
        );
        let gateway_client = GatewayClient::with_base_url(&gateway.uri(), signer)
            .map_err(|e| anyhow::anyhow!("Failed to build gateway client: {}", e))?;
        let key_client = PublicKeyClient::with_base_url(&gateway.uri())
            .map_err(|e| anyhow::anyhow!("Failed to build key client: {}", e))?;
        let verifier = TokenVerifier::new(key_client, config.verification_leeway_seconds);
        let capture_context = CaptureContextService::new(gateway_client, verifier);

        let state = Arc::new(AppState {
            config,
            capture_context,
            order_request: OrderRequest::new(options.order_body),
        });

        let app = build_routes(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            gateway,
            signing_key,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the mock gateway for mounting expectations
    pub fn gateway(&self) -> &MockServer {
        &self.gateway
    }

    /// Get reference to the RSA key tokens must be signed with
    pub fn signing_key(&self) -> &TestRsaKey {
        &self.signing_key
    }

    /// Serve the harness key's JWK from the public-key endpoint
    ///
    /// Mounts a 200 response on the path the server's verifier fetches
    /// for this key's id. Tokens signed with [`Self::signing_key`] then
    /// pass signature verification.
    pub async fn mount_public_key(&self) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/flex/v2/public-keys/{}",
                self.signing_key.kid()
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(self.signing_key.jwk_json()))
            .mount(&self.gateway)
            .await;
    }

    /// Serve a capture-context response from the mock gateway
    ///
    /// # Arguments
    /// * `status` - HTTP status the gateway should answer with
    /// * `body` - Response body, usually a signed token
    pub async fn mount_capture_context(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/up/v1/capture-contexts"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.gateway)
            .await;
    }
}

impl Drop for TestCheckoutServer {
    fn drop(&mut self) {
        // Explicitly abort the HTTP server task to ensure immediate cleanup
        // when the test completes.
        self._handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestCheckoutServer::spawn().await?;

        assert!(server.url().starts_with("http://127.0.0.1:"));

        // Verify health endpoint works
        let response = reqwest::get(&format!("{}/v1/health", server.url())).await?;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = response.json().await?;
        assert_eq!(body["status"], "healthy");

        Ok(())
    }

    #[tokio::test]
    async fn test_mounted_public_key_is_served() -> Result<(), anyhow::Error> {
        let server = TestCheckoutServer::spawn().await?;
        server.mount_public_key().await;

        let url = format!(
            "{}/flex/v2/public-keys/{}",
            server.gateway().uri(),
            server.signing_key().kid()
        );
        let jwk: serde_json::Value = reqwest::get(&url).await?.json().await?;

        assert_eq!(jwk["kty"], "RSA");
        assert_eq!(jwk["kid"], server.signing_key().kid());

        Ok(())
    }
}
