//! Token structure checks and signature verification.
//!
//! Verification runs in two phases. Structural checks (size, segment
//! count, base64url, header shape) happen first and never touch the
//! network, so a garbled token cannot trigger a key fetch. Only once the
//! structure holds is the signing key resolved and the RS256 signature
//! checked, along with any time-based claims the payload carries.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};

use crate::errors::CheckoutError;
use crate::token::keys::PublicKeyClient;

/// Maximum accepted token size in bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Structural pieces of a token, extracted before signature verification.
#[derive(Debug)]
struct DecodedSegments {
    /// Key id from the protected header.
    kid: String,
    /// Raw payload bytes from the second segment.
    payload: Vec<u8>,
}

/// Verifier for RS256-signed capture-context tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: PublicKeyClient,
    leeway_seconds: u64,
}

impl TokenVerifier {
    /// Create a verifier that resolves keys through `keys` and applies
    /// `leeway_seconds` to time-based claim checks.
    #[must_use]
    pub fn new(keys: PublicKeyClient, leeway_seconds: u64) -> Self {
        TokenVerifier {
            keys,
            leeway_seconds,
        }
    }

    /// Verify `token` end to end and return its decoded payload bytes.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::MalformedToken`] for structural problems, raised
    ///   before any key fetch.
    /// - [`CheckoutError::KeyResolution`] when the signing key cannot be
    ///   resolved.
    /// - [`CheckoutError::SignatureVerification`] when the signature or a
    ///   time-based claim fails.
    /// - [`CheckoutError::PayloadParse`] when a verified payload does not
    ///   deserialize.
    pub async fn verify(&self, token: &str) -> Result<Vec<u8>, CheckoutError> {
        let segments = decompose(token)?;

        let key = self.keys.resolve(&segments.kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Capture contexts carry no audience and are not guaranteed to
        // carry exp. Time-based claims are checked when present.
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<serde_json::Value>(token, &key, &validation)
            .map_err(classify_decode_error)?;

        if let Some(iat) = data.claims.get("iat").and_then(serde_json::Value::as_i64) {
            validate_iat(iat, self.leeway_seconds)?;
        }

        tracing::debug!(
            target: "checkout.token.verify",
            kid = %segments.kid,
            "token signature verified"
        );

        Ok(segments.payload)
    }
}

/// Split the token and decode its non-signature segments.
///
/// Every failure here is structural and surfaces as `MalformedToken`.
fn decompose(token: &str) -> Result<DecodedSegments, CheckoutError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        return Err(CheckoutError::MalformedToken(format!(
            "token exceeds {MAX_TOKEN_SIZE_BYTES} bytes"
        )));
    }

    let segments: Vec<&str> = token.split('.').collect();
    let (header_b64, payload_b64) = match segments.as_slice() {
        [header, payload, _signature] => (*header, *payload),
        parts => {
            return Err(CheckoutError::MalformedToken(format!(
                "expected 3 segments, found {}",
                parts.len()
            )))
        }
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_b64).map_err(|e| {
        CheckoutError::MalformedToken(format!("header is not base64url: {e}"))
    })?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|e| {
        CheckoutError::MalformedToken(format!("payload is not base64url: {e}"))
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes)
        .map_err(|e| CheckoutError::MalformedToken(format!("header is not JSON: {e}")))?;

    let kid = header
        .get("kid")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|kid| !kid.is_empty())
        .ok_or_else(|| CheckoutError::MalformedToken("header has no kid".to_string()))?
        .to_string();

    Ok(DecodedSegments { kid, payload })
}

/// Map jsonwebtoken errors onto the pipeline taxonomy.
///
/// Signature and time-window failures are verification errors. A payload
/// that passed the signature check but does not deserialize is a parse
/// error, not a verification one.
fn classify_decode_error(error: jsonwebtoken::errors::Error) -> CheckoutError {
    match error.kind() {
        ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            CheckoutError::PayloadParse(format!("verified payload did not parse: {error}"))
        }
        ErrorKind::Base64(_) => {
            CheckoutError::MalformedToken(format!("token is not base64url: {error}"))
        }
        _ => CheckoutError::SignatureVerification(error.to_string()),
    }
}

/// Validate an `iat` claim against the current time.
fn validate_iat(iat: i64, leeway_seconds: u64) -> Result<(), CheckoutError> {
    validate_iat_at(iat, leeway_seconds, Utc::now().timestamp())
}

/// Reject tokens that claim to be issued in the future beyond the leeway.
///
/// jsonwebtoken checks exp and nbf but leaves iat alone, so this check
/// lives here. `now` is a parameter to keep the boundary testable.
fn validate_iat_at(iat: i64, leeway_seconds: u64, now: i64) -> Result<(), CheckoutError> {
    let leeway = i64::try_from(leeway_seconds).unwrap_or(i64::MAX);
    if iat > now.saturating_add(leeway) {
        return Err(CheckoutError::SignatureVerification(format!(
            "token issued in the future: iat {iat}, now {now}"
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
