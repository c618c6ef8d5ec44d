//! Payment gateway client.
//!
//! One job: POST the server-held order to the gateway's capture-context
//! endpoint and hand back the signed token from the response body. Every
//! request is authenticated with the merchant's HTTP signature.

use std::time::Duration;

use crate::errors::CheckoutError;
use crate::models::OrderRequest;
use crate::services::signature::RequestSigner;

/// Path of the gateway's capture-context endpoint.
const CAPTURE_CONTEXT_PATH: &str = "/up/v1/capture-contexts";

/// Total timeout for one gateway request.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connect timeout for gateway requests.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Upstream response characters kept in error details.
const ERROR_DETAIL_MAX_CHARS: usize = 256;

/// Client for the gateway's capture-context endpoint.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    host: String,
    signer: RequestSigner,
}

impl GatewayClient {
    /// Create a client that talks to `https://{trusted_host}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(trusted_host: &str, signer: RequestSigner) -> Result<Self, CheckoutError> {
        Self::with_base_url(&format!("https://{trusted_host}"), signer)
    }

    /// Create a client against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no host or the underlying HTTP
    /// client cannot be built.
    pub fn with_base_url(base_url: &str, signer: RequestSigner) -> Result<Self, CheckoutError> {
        // The signature covers the host header, so derive the signed
        // value from the URL the client will actually connect to.
        let url = reqwest::Url::parse(base_url)
            .map_err(|e| CheckoutError::Internal(format!("invalid gateway base URL: {e}")))?;
        let host = url.host_str().ok_or_else(|| {
            CheckoutError::Internal("gateway base URL has no host".to_string())
        })?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                CheckoutError::Internal(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(GatewayClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            host,
            signer,
        })
    }

    /// Request a capture context for `order` and return the raw token.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Gateway`] for transport failures (no
    /// upstream status) and non-success responses (upstream status
    /// attached). A request that times out returns
    /// [`CheckoutError::Cancelled`].
    pub async fn request_capture_context(
        &self,
        order: &OrderRequest,
    ) -> Result<String, CheckoutError> {
        let body = serde_json::to_vec(order.body()).map_err(|e| {
            CheckoutError::Internal(format!("order request serialization: {e}"))
        })?;

        let headers = self.signer.sign(&self.host, CAPTURE_CONTEXT_PATH, &body)?;

        let url = format!("{}{CAPTURE_CONTEXT_PATH}", self.base_url);
        tracing::debug!(target: "checkout.gateway", "requesting capture context");

        let response = self
            .client
            .post(&url)
            .header("date", &headers.date)
            .header("digest", &headers.digest)
            .header("signature", &headers.signature)
            .header("v-c-merchant-id", self.signer.merchant_id())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CheckoutError::Cancelled(format!("gateway request timed out: {e}"))
                } else {
                    CheckoutError::Gateway {
                        status: None,
                        detail: format!("transport failure: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if matches!(status.as_u16(), 200 | 201) {
            let token = response.text().await.map_err(|e| CheckoutError::Gateway {
                status: Some(status.as_u16()),
                detail: format!("reading response body: {e}"),
            })?;
            tracing::debug!(
                target: "checkout.gateway",
                status = status.as_u16(),
                "capture context issued"
            );
            return Ok(token.trim().to_string());
        }

        let detail: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(ERROR_DETAIL_MAX_CHARS)
            .collect();
        tracing::warn!(
            target: "checkout.gateway",
            status = status.as_u16(),
            "gateway rejected capture-context request"
        );
        Err(CheckoutError::Gateway {
            status: Some(status.as_u16()),
            detail,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
