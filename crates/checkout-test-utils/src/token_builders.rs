//! Builders for capture-context test tokens
//!
//! CaptureContextTokenBuilder produces payloads shaped like the gateway's
//! capture contexts and signs them with a test RSA key.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::{json, Map, Value};

use crate::crypto_fixtures::{FixtureError, TestRsaKey};

/// Builder for capture-context payloads and signed tokens.
///
/// Defaults to a token that verifies cleanly: issued now, expiring in
/// 15 minutes, with one `ctx` entry carrying both client-library claims.
///
/// # Example
/// ```rust,ignore
/// let key = TestRsaKey::generate("test-key-01")?;
/// let token = CaptureContextTokenBuilder::new()
///     .with_client_library("https://example.com/lib.js")
///     .without_integrity()
///     .sign(&key)?;
/// ```
pub struct CaptureContextTokenBuilder {
    issuer: String,
    issued_at: i64,
    expires_at: Option<i64>,
    not_before: Option<i64>,
    client_library: Option<String>,
    client_library_integrity: Option<String>,
    include_ctx: bool,
    empty_ctx: bool,
}

impl CaptureContextTokenBuilder {
    /// Start from a token that verifies cleanly.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        CaptureContextTokenBuilder {
            issuer: "Flex API".to_string(),
            issued_at: now,
            expires_at: Some(now + 900),
            not_before: None,
            client_library: Some(
                "https://testflex.example.com/microform/bundle/v2/flex-microform.min.js"
                    .to_string(),
            ),
            client_library_integrity: Some("sha256-dGVzdC1pbnRlZ3JpdHktaGFzaA".to_string()),
            include_ctx: true,
            empty_ctx: false,
        }
    }

    /// Set the clientLibrary claim.
    pub fn with_client_library(mut self, url: &str) -> Self {
        self.client_library = Some(url.to_string());
        self
    }

    /// Drop the clientLibrary claim.
    pub fn without_client_library(mut self) -> Self {
        self.client_library = None;
        self
    }

    /// Set the clientLibraryIntegrity claim.
    pub fn with_integrity(mut self, integrity: &str) -> Self {
        self.client_library_integrity = Some(integrity.to_string());
        self
    }

    /// Drop the clientLibraryIntegrity claim.
    pub fn without_integrity(mut self) -> Self {
        self.client_library_integrity = None;
        self
    }

    /// Set the iat claim.
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.issued_at = iat;
        self
    }

    /// Set the exp claim.
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.expires_at = Some(exp);
        self
    }

    /// Drop the exp claim entirely.
    pub fn without_expiry(mut self) -> Self {
        self.expires_at = None;
        self
    }

    /// Set the nbf claim.
    pub fn not_before(mut self, nbf: i64) -> Self {
        self.not_before = Some(nbf);
        self
    }

    /// Shape the token as one that expired `seconds_ago` seconds ago.
    pub fn expired_seconds_ago(mut self, seconds_ago: i64) -> Self {
        let exp = Utc::now().timestamp() - seconds_ago;
        self.expires_at = Some(exp);
        self.issued_at = exp - 900;
        self
    }

    /// Drop the ctx claim entirely.
    pub fn without_ctx(mut self) -> Self {
        self.include_ctx = false;
        self
    }

    /// Keep ctx present but empty.
    pub fn with_empty_ctx(mut self) -> Self {
        self.include_ctx = true;
        self.empty_ctx = true;
        self
    }

    /// The payload claims as JSON.
    pub fn build_claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(self.issuer));
        claims.insert("iat".to_string(), json!(self.issued_at));
        claims.insert("jti".to_string(), json!(format!("FXT-{}", self.issued_at)));

        if let Some(exp) = self.expires_at {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(nbf) = self.not_before {
            claims.insert("nbf".to_string(), json!(nbf));
        }

        if self.include_ctx {
            let entries = if self.empty_ctx {
                Vec::new()
            } else {
                let mut data = Map::new();
                data.insert(
                    "targetOrigins".to_string(),
                    json!(["https://storefront.example.com"]),
                );
                if let Some(library) = &self.client_library {
                    data.insert("clientLibrary".to_string(), json!(library));
                }
                if let Some(integrity) = &self.client_library_integrity {
                    data.insert("clientLibraryIntegrity".to_string(), json!(integrity));
                }
                vec![json!({"data": data, "type": "mf-2.1.0"})]
            };
            claims.insert("ctx".to_string(), Value::Array(entries));
        }

        Value::Object(claims)
    }

    /// Sign the claims into a compact RS256 token carrying the key's id.
    pub fn sign(&self, key: &TestRsaKey) -> Result<String, FixtureError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(key.kid().to_string());

        let encoding_key = key.encoding_key()?;
        encode(&header, &self.build_claims(), &encoding_key)
            .map_err(|e| FixtureError::Crypto(format!("Token signing failed: {e}")))
    }
}

impl Default for CaptureContextTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
