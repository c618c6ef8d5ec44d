//! Error types for the checkout service.
//!
//! Every fallible operation in the service converges on [`CheckoutError`].
//! The variants mirror the stages of the capture-context pipeline: talking
//! to the payment gateway, resolving the signing key, verifying the token,
//! and parsing its payload. Each variant maps to an HTTP status code and a
//! stable machine-readable error code; the full error detail is logged
//! server-side while clients receive a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::ConfigError;

/// Checkout service error type.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The token is not structurally a JWT. Raised before any network
    /// activity, so a garbled token never triggers a key lookup.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The verification key could not be fetched or decoded.
    #[error("Key resolution failed: {0}")]
    KeyResolution(String),

    /// The token signature or its time-based claims did not check out.
    #[error("Signature verification failed: {0}")]
    SignatureVerification(String),

    /// The token payload is not valid JSON or is structurally malformed.
    #[error("Payload parse failed: {0}")]
    PayloadParse(String),

    /// The payment gateway rejected the request or was unreachable.
    /// `status` is the upstream HTTP status when one was received.
    #[error("Gateway error: {detail}")]
    Gateway {
        status: Option<u16>,
        detail: String,
    },

    /// Umbrella for any failure while establishing trust in a token the
    /// gateway returned. A gateway that hands us a token we cannot verify
    /// is a fatal condition, not a degraded one.
    #[error("Trust verification failed: {0}")]
    TrustVerification(String),

    /// The operation was cancelled before completion, typically because a
    /// deadline elapsed. Never wrapped into other variants.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Map the error to an HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            CheckoutError::TrustVerification(_)
            | CheckoutError::MalformedToken(_)
            | CheckoutError::KeyResolution(_)
            | CheckoutError::SignatureVerification(_)
            | CheckoutError::PayloadParse(_) => StatusCode::BAD_GATEWAY,
            CheckoutError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
            CheckoutError::Config(_) | CheckoutError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// Error detail within an error response.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    /// Machine-readable error code.
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Clients get a stable code and a generic message; the variant
        // detail stays in the server logs.
        let (code, message) = match &self {
            CheckoutError::Gateway { .. } => {
                ("GATEWAY_ERROR", "Payment gateway request failed")
            }
            CheckoutError::TrustVerification(_)
            | CheckoutError::MalformedToken(_)
            | CheckoutError::KeyResolution(_)
            | CheckoutError::SignatureVerification(_)
            | CheckoutError::PayloadParse(_) => (
                "TRUST_VERIFICATION_FAILED",
                "Capture context could not be verified",
            ),
            CheckoutError::Cancelled(_) => {
                ("UPSTREAM_TIMEOUT", "Request timed out")
            }
            CheckoutError::Config(_) | CheckoutError::Internal(_) => {
                ("INTERNAL_ERROR", "Internal server error")
            }
        };

        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!(target: "checkout.http", error = %self, "request failed");
        } else {
            tracing::warn!(target: "checkout.http", error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Tests
// ============================================================================
