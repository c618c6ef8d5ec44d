//! RSA key fixtures for token tests
//!
//! Provides freshly generated RSA keypairs that can both sign test tokens
//! and serve the matching JWK the way the gateway's public-key endpoint
//! would.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::EncodingKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::json;
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// An RSA keypair with a key id, for signing test tokens and serving the
/// matching verification key.
///
/// Keys are generated fresh per test. Determinism is not needed here:
/// each harness serves the JWK for the same key that signed its tokens.
pub struct TestRsaKey {
    kid: String,
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl TestRsaKey {
    /// Generate a 2048-bit RSA keypair under the given key id.
    ///
    /// # Arguments
    /// * `kid` - Key id to bake into token headers and the served JWK
    ///
    /// # Returns
    /// * `Ok(TestRsaKey)` - Usable keypair
    /// * `Err(FixtureError)` - If key generation fails
    pub fn generate(kid: &str) -> Result<Self, FixtureError> {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048)
            .map_err(|e| FixtureError::Crypto(format!("Failed to generate RSA key: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);

        Ok(TestRsaKey {
            kid: kid.to_string(),
            private_key,
            public_key,
        })
    }

    /// Key id baked into signed tokens and the served JWK.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public modulus, base64url without padding.
    pub fn modulus_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be())
    }

    /// Public exponent, base64url without padding.
    pub fn exponent_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be())
    }

    /// The JWK document the gateway would serve for this key.
    pub fn jwk_json(&self) -> serde_json::Value {
        json!({
            "kty": "RSA",
            "use": "enc",
            "kid": self.kid,
            "n": self.modulus_b64(),
            "e": self.exponent_b64(),
        })
    }

    /// Encoding key for signing test tokens.
    ///
    /// jsonwebtoken expects RSA private keys in PKCS#1 DER form.
    pub fn encoding_key(&self) -> Result<EncodingKey, FixtureError> {
        let der = self
            .private_key
            .to_pkcs1_der()
            .map_err(|e| FixtureError::Crypto(format!("PKCS#1 encoding failed: {e}")))?;
        Ok(EncodingKey::from_rsa_der(der.as_bytes()))
    }
}
