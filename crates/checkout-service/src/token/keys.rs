//! Verification key resolution.
//!
//! Capture-context tokens carry a `kid` header naming the RSA key the
//! gateway signed them with. The key is published as a JWK at
//! `/flex/v2/public-keys/{kid}` on the same trusted host that issued the
//! token, so resolution is a single authenticated-by-TLS GET.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;

use crate::errors::CheckoutError;

/// Total timeout for one key fetch.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connect timeout for key fetches.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// An RSA public key in JWK form, as served by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type. When present, only `RSA` is accepted.
    #[serde(default)]
    pub kty: Option<String>,
    /// Key identifier.
    #[serde(default)]
    pub kid: Option<String>,
    /// Intended key use (`enc` for capture-context keys).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    /// Modulus, base64url without padding.
    pub n: String,
    /// Public exponent, base64url without padding.
    pub e: String,
}

/// Client for the gateway's public-key endpoint.
///
/// Keys are fetched once per verification and never stored. Signing keys
/// rotate on the gateway's schedule, and a stale cached key would turn
/// rotation into an outage; if fetch volume ever becomes a problem, a
/// short-TTL cache keyed by kid belongs here.
#[derive(Clone)]
pub struct PublicKeyClient {
    client: reqwest::Client,
    base_url: String,
}

impl PublicKeyClient {
    /// Create a client that resolves keys from `https://{trusted_host}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(trusted_host: &str) -> Result<Self, CheckoutError> {
        Self::with_base_url(&format!("https://{trusted_host}"))
    }

    /// Create a client against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, CheckoutError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                CheckoutError::Internal(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(PublicKeyClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve the RSA verification key for `kid`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::KeyResolution`] if the key cannot be
    /// fetched, is not an RSA key, or its components do not decode.
    /// A fetch that times out returns [`CheckoutError::Cancelled`].
    pub async fn resolve(&self, kid: &str) -> Result<DecodingKey, CheckoutError> {
        // An empty kid would turn the request into a listing of the
        // key collection. Reject it before touching the network.
        if kid.trim().is_empty() {
            return Err(CheckoutError::KeyResolution("empty key id".to_string()));
        }

        // The kid lands in the request path as-is, so URL metacharacters
        // would let a token address a different resource on the host.
        if kid.contains(['/', '\\', '?', '#', '%']) {
            return Err(CheckoutError::KeyResolution(
                "key id contains URL metacharacters".to_string(),
            ));
        }

        let url = format!("{}/flex/v2/public-keys/{kid}", self.base_url);
        tracing::debug!(target: "checkout.token.keys", %kid, "fetching verification key");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                CheckoutError::Cancelled(format!("key fetch timed out: {e}"))
            } else {
                CheckoutError::KeyResolution(format!("key fetch failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target: "checkout.token.keys",
                %kid,
                status = status.as_u16(),
                "key endpoint returned non-success status"
            );
            return Err(CheckoutError::KeyResolution(format!(
                "key endpoint returned status {status}"
            )));
        }

        let jwk: Jwk = response.json().await.map_err(|e| {
            CheckoutError::KeyResolution(format!("invalid key document: {e}"))
        })?;

        decoding_key_from_jwk(&jwk)
    }
}

/// Build a [`DecodingKey`] from a JWK, validating the key material first.
fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, CheckoutError> {
    // The endpoint only publishes RSA keys, so a missing kty is fine;
    // an explicit non-RSA kty means this key can never verify RS256.
    if let Some(kty) = jwk.kty.as_deref() {
        if kty != "RSA" {
            return Err(CheckoutError::KeyResolution(format!(
                "unsupported key type: {kty}"
            )));
        }
    }

    // from_rsa_components accepts the base64url strings as-is, so decode
    // them here to catch garbage components with a clear error.
    let modulus = URL_SAFE_NO_PAD.decode(&jwk.n).map_err(|e| {
        CheckoutError::KeyResolution(format!("modulus is not base64url: {e}"))
    })?;
    let exponent = URL_SAFE_NO_PAD.decode(&jwk.e).map_err(|e| {
        CheckoutError::KeyResolution(format!("exponent is not base64url: {e}"))
    })?;
    if modulus.is_empty() || exponent.is_empty() {
        return Err(CheckoutError::KeyResolution(
            "empty RSA key component".to_string(),
        ));
    }

    DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
        CheckoutError::KeyResolution(format!("invalid RSA key components: {e}"))
    })
}

// ============================================================================
// Tests
// ============================================================================
