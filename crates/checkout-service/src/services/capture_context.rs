//! Checkout orchestration.
//!
//! One call ties the pipeline together: request a capture context from
//! the gateway, verify the returned token against the gateway's published
//! key, extract the client-library claims, and resolve the order total to
//! display. A token the gateway returned but the service cannot verify is
//! fatal for the whole checkout.

use tracing::instrument;

use crate::errors::CheckoutError;
use crate::models::OrderRequest;
use crate::services::gateway::GatewayClient;
use crate::token::claims::{extract_client_library, ClientLibraryClaims};
use crate::token::verify::TokenVerifier;

/// Display amount used when the order carries none.
pub const DEFAULT_DISPLAY_AMOUNT: &str = "0.01";

/// A verified capture context, ready for the checkout page.
#[derive(Debug, Clone)]
pub struct CaptureContext {
    /// The verified token, passed through to the browser library.
    pub token: String,
    /// Client-library claims extracted from the token payload.
    pub claims: ClientLibraryClaims,
    /// Order total to display.
    pub display_amount: String,
}

/// Orchestrates one capture-context acquisition.
#[derive(Clone)]
pub struct CaptureContextService {
    gateway: GatewayClient,
    verifier: TokenVerifier,
}

impl CaptureContextService {
    /// Create the orchestration over a gateway client and verifier.
    #[must_use]
    pub fn new(gateway: GatewayClient, verifier: TokenVerifier) -> Self {
        CaptureContextService { gateway, verifier }
    }

    /// Obtain and verify a capture context for `order`.
    ///
    /// # Errors
    ///
    /// - Gateway failures surface as [`CheckoutError::Gateway`] with the
    ///   upstream status attached when one was received.
    /// - Any failure verifying or reading the returned token surfaces as
    ///   [`CheckoutError::TrustVerification`].
    /// - [`CheckoutError::Cancelled`] passes through untouched, so callers
    ///   can tell a deadline from a rejected token.
    #[instrument(skip_all, name = "checkout.capture_context.obtain")]
    pub async fn obtain(&self, order: &OrderRequest) -> Result<CaptureContext, CheckoutError> {
        let token = self.gateway.request_capture_context(order).await?;

        let payload = self.verifier.verify(&token).await.map_err(trust_failure)?;
        let claims = extract_client_library(&payload).map_err(trust_failure)?;

        let display_amount = order
            .display_amount()
            .unwrap_or_else(|| DEFAULT_DISPLAY_AMOUNT.to_string());

        tracing::debug!(
            target: "checkout.capture_context",
            has_client_library = claims.client_library.is_some(),
            %display_amount,
            "capture context verified"
        );

        Ok(CaptureContext {
            token,
            claims,
            display_amount,
        })
    }
}

/// Mark a post-gateway pipeline failure as fatal.
///
/// Cancellation is not a verdict on the token and stays distinct.
fn trust_failure(error: CheckoutError) -> CheckoutError {
    match error {
        CheckoutError::Cancelled(_) => error,
        other => {
            tracing::warn!(
                target: "checkout.capture_context",
                error = %other,
                "capture context failed trust verification"
            );
            CheckoutError::TrustVerification(other.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
