//! Configuration for the checkout service.
//!
//! All settings come from environment variables. Merchant credentials are
//! required and have no defaults; everything else falls back to values
//! suitable for the payment gateway sandbox.

use std::collections::HashMap;
use std::env;
use std::fmt;

use secrecy::SecretString;

/// Default address the HTTP server binds to.
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default payment gateway host (sandbox environment).
const DEFAULT_GATEWAY_HOST: &str = "apitest.cybersource.com";

/// Default leeway applied to time-based token claims, in seconds.
const DEFAULT_VERIFICATION_LEEWAY_SECONDS: u64 = 20;

/// Upper bound for the verification leeway. Anything larger would let
/// badly skewed clocks accept long-expired tokens.
const MAX_VERIFICATION_LEEWAY_SECONDS: u64 = 120;

/// Default deadline for one full checkout orchestration, in seconds.
const DEFAULT_CHECKOUT_DEADLINE_SECONDS: u64 = 15;

/// Default path of the order request fixture loaded at startup.
const DEFAULT_ORDER_REQUEST_PATH: &str = "config/order-request.json";

/// Configuration for the checkout service.
#[derive(Clone)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_address: String,
    /// Payment gateway host. Used for both the capture-context request and
    /// the public-key fetch during token verification.
    pub gateway_host: String,
    /// Merchant identifier sent with every gateway request.
    pub merchant_id: String,
    /// Identifier of the shared secret used to sign gateway requests.
    pub merchant_key_id: String,
    /// Base64-encoded shared secret used to sign gateway requests.
    pub merchant_secret_key: SecretString,
    /// Leeway in seconds applied to exp/nbf/iat claim checks.
    pub verification_leeway_seconds: u64,
    /// Deadline in seconds for one checkout orchestration.
    pub checkout_deadline_seconds: u64,
    /// Path of the order request fixture loaded at startup.
    pub order_request_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from the provided variable map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a
    /// value fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("CHECKOUT_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let gateway_host = vars
            .get("CHECKOUT_GATEWAY_HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_GATEWAY_HOST.to_string());

        let merchant_id = vars
            .get("CHECKOUT_MERCHANT_ID")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnvVar("CHECKOUT_MERCHANT_ID".to_string()))?;

        let merchant_key_id = vars
            .get("CHECKOUT_MERCHANT_KEY_ID")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnvVar("CHECKOUT_MERCHANT_KEY_ID".to_string()))?;

        let merchant_secret_key = vars
            .get("CHECKOUT_MERCHANT_SECRET_KEY")
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| {
                ConfigError::MissingEnvVar("CHECKOUT_MERCHANT_SECRET_KEY".to_string())
            })?;

        let verification_leeway_seconds =
            match vars.get("CHECKOUT_VERIFICATION_LEEWAY_SECONDS") {
                Some(raw) => {
                    let seconds: u64 = raw
                        .parse()
                        .map_err(|_| ConfigError::InvalidLeeway(raw.clone()))?;
                    if seconds > MAX_VERIFICATION_LEEWAY_SECONDS {
                        return Err(ConfigError::InvalidLeeway(raw.clone()));
                    }
                    seconds
                }
                None => DEFAULT_VERIFICATION_LEEWAY_SECONDS,
            };

        let checkout_deadline_seconds = match vars.get("CHECKOUT_DEADLINE_SECONDS") {
            Some(raw) => {
                let seconds: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidDeadline(raw.clone()))?;
                if seconds == 0 {
                    return Err(ConfigError::InvalidDeadline(raw.clone()));
                }
                seconds
            }
            None => DEFAULT_CHECKOUT_DEADLINE_SECONDS,
        };

        let order_request_path = vars
            .get("CHECKOUT_ORDER_REQUEST_PATH")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ORDER_REQUEST_PATH.to_string());

        Ok(Config {
            bind_address,
            gateway_host,
            merchant_id,
            merchant_key_id,
            merchant_secret_key,
            verification_leeway_seconds,
            checkout_deadline_seconds,
            order_request_path,
        })
    }
}

// Manual Debug so the merchant secret never reaches logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("gateway_host", &self.gateway_host)
            .field("merchant_id", &self.merchant_id)
            .field("merchant_key_id", &self.merchant_key_id)
            .field("merchant_secret_key", &"[REDACTED]")
            .field(
                "verification_leeway_seconds",
                &self.verification_leeway_seconds,
            )
            .field("checkout_deadline_seconds", &self.checkout_deadline_seconds)
            .field("order_request_path", &self.order_request_path)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The verification leeway is not a number of seconds within bounds.
    #[error("Invalid verification leeway: {0}")]
    InvalidLeeway(String),

    /// The checkout deadline is zero or not a number of seconds.
    #[error("Invalid checkout deadline: {0}")]
    InvalidDeadline(String),

    /// The order request fixture is missing or not valid JSON.
    #[error("Invalid order request fixture: {0}")]
    InvalidOrderRequest(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    /// Minimal variable set that satisfies all required settings.
    fn base_vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("CHECKOUT_MERCHANT_ID".to_string(), "testrest".to_string());
        vars.insert(
            "CHECKOUT_MERCHANT_KEY_ID".to_string(),
            "key-id-01".to_string(),
        );
        vars.insert(
            "CHECKOUT_MERCHANT_SECRET_KEY".to_string(),
            "c2VjcmV0LWtleS1ieXRlcw==".to_string(),
        );
        vars
    }

    #[test]
    fn test_from_vars_with_required_vars_applies_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.gateway_host, "apitest.cybersource.com");
        assert_eq!(config.merchant_id, "testrest");
        assert_eq!(config.merchant_key_id, "key-id-01");
        assert_eq!(
            config.merchant_secret_key.expose_secret(),
            "c2VjcmV0LWtleS1ieXRlcw=="
        );
        assert_eq!(config.verification_leeway_seconds, 20);
        assert_eq!(config.checkout_deadline_seconds, 15);
        assert_eq!(config.order_request_path, "config/order-request.json");
    }

    #[test]
    fn test_from_vars_custom_values_override_defaults() {
        let mut vars = base_vars();
        vars.insert(
            "CHECKOUT_BIND_ADDRESS".to_string(),
            "127.0.0.1:9090".to_string(),
        );
        vars.insert(
            "CHECKOUT_GATEWAY_HOST".to_string(),
            "api.cybersource.com".to_string(),
        );
        vars.insert(
            "CHECKOUT_VERIFICATION_LEEWAY_SECONDS".to_string(),
            "60".to_string(),
        );
        vars.insert("CHECKOUT_DEADLINE_SECONDS".to_string(), "30".to_string());
        vars.insert(
            "CHECKOUT_ORDER_REQUEST_PATH".to_string(),
            "/etc/checkout/order.json".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:9090");
        assert_eq!(config.gateway_host, "api.cybersource.com");
        assert_eq!(config.verification_leeway_seconds, 60);
        assert_eq!(config.checkout_deadline_seconds, 30);
        assert_eq!(config.order_request_path, "/etc/checkout/order.json");
    }

    #[test]
    fn test_from_vars_missing_merchant_id_fails() {
        let mut vars = base_vars();
        vars.remove("CHECKOUT_MERCHANT_ID");

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(name)) if name == "CHECKOUT_MERCHANT_ID"
        ));
    }

    #[test]
    fn test_from_vars_missing_merchant_key_id_fails() {
        let mut vars = base_vars();
        vars.remove("CHECKOUT_MERCHANT_KEY_ID");

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(name)) if name == "CHECKOUT_MERCHANT_KEY_ID"
        ));
    }

    #[test]
    fn test_from_vars_missing_merchant_secret_key_fails() {
        let mut vars = base_vars();
        vars.remove("CHECKOUT_MERCHANT_SECRET_KEY");

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(name)) if name == "CHECKOUT_MERCHANT_SECRET_KEY"
        ));
    }

    #[test]
    fn test_from_vars_accepts_zero_leeway() {
        let mut vars = base_vars();
        vars.insert(
            "CHECKOUT_VERIFICATION_LEEWAY_SECONDS".to_string(),
            "0".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.verification_leeway_seconds, 0);
    }

    #[test]
    fn test_from_vars_rejects_leeway_above_bound() {
        let mut vars = base_vars();
        vars.insert(
            "CHECKOUT_VERIFICATION_LEEWAY_SECONDS".to_string(),
            "121".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidLeeway(_))));
    }

    #[test]
    fn test_from_vars_rejects_non_numeric_leeway() {
        let mut vars = base_vars();
        vars.insert(
            "CHECKOUT_VERIFICATION_LEEWAY_SECONDS".to_string(),
            "twenty".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidLeeway(_))));
    }

    #[test]
    fn test_from_vars_rejects_zero_deadline() {
        let mut vars = base_vars();
        vars.insert("CHECKOUT_DEADLINE_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidDeadline(_))));
    }

    #[test]
    fn test_from_vars_rejects_non_numeric_deadline() {
        let mut vars = base_vars();
        vars.insert("CHECKOUT_DEADLINE_SECONDS".to_string(), "soon".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidDeadline(_))));
    }

    #[test]
    fn test_debug_redacts_merchant_secret() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug = format!("{config:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c2VjcmV0LWtleS1ieXRlcw=="));
    }
}
