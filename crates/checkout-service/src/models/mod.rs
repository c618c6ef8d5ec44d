//! Shared data models for the checkout service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// The order request sent to the gateway's capture-context endpoint.
///
/// The body is held as raw JSON. The gateway owns the order schema; this
/// service forwards it verbatim and only ever reads the order total back
/// out for display.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    body: serde_json::Value,
}

impl OrderRequest {
    /// Wrap an order body.
    #[must_use]
    pub fn new(body: serde_json::Value) -> Self {
        OrderRequest { body }
    }

    /// Load the order request from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOrderRequest`] when the file is
    /// missing, unreadable, or does not hold a JSON object. Startup
    /// fails on this error; a checkout service without an order to
    /// submit has nothing to serve.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidOrderRequest(format!("{}: {e}", path.display()))
        })?;
        let body: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            ConfigError::InvalidOrderRequest(format!("{}: {e}", path.display()))
        })?;
        if !body.is_object() {
            return Err(ConfigError::InvalidOrderRequest(format!(
                "{}: expected a JSON object",
                path.display()
            )));
        }
        Ok(OrderRequest { body })
    }

    /// The raw body to send to the gateway.
    #[must_use]
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// The order total for display, when the order carries one.
    ///
    /// Reads `orderInformation.amountDetails.totalAmount`. String and
    /// numeric amounts are accepted; a missing or mistyped amount is
    /// absent, and the caller decides the default.
    #[must_use]
    pub fn display_amount(&self) -> Option<String> {
        let outline = OrderOutline::deserialize(&self.body).ok()?;
        let amount = outline.order_information?.amount_details?.total_amount?;
        match amount {
            serde_json::Value::String(amount) => Some(amount),
            serde_json::Value::Number(amount) => Some(amount.to_string()),
            _ => None,
        }
    }
}

/// Tolerant view of the order fields this service reads.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OrderOutline {
    order_information: Option<OrderInformation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OrderInformation {
    amount_details: Option<AmountDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AmountDetails {
    total_amount: Option<serde_json::Value>,
}

/// Response body for the checkout endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// The verified capture-context token, handed to the browser library.
    pub capture_context: String,
    /// Gateway browser library URL, when the token named one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_library: Option<String>,
    /// Subresource integrity hash for the library.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_library_integrity: Option<String>,
    /// Order total to display on the checkout page.
    pub total_amount: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Configured payment gateway host.
    pub gateway_host: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_amount_reads_string_total() {
        let order = OrderRequest::new(json!({
            "orderInformation": {
                "amountDetails": {"totalAmount": "42.50", "currency": "USD"}
            }
        }));

        assert_eq!(order.display_amount().as_deref(), Some("42.50"));
    }

    #[test]
    fn test_display_amount_accepts_numeric_total() {
        let order = OrderRequest::new(json!({
            "orderInformation": {
                "amountDetails": {"totalAmount": 42.5}
            }
        }));

        assert_eq!(order.display_amount().as_deref(), Some("42.5"));
    }

    #[test]
    fn test_display_amount_is_absent_without_amount_details() {
        let order = OrderRequest::new(json!({
            "orderInformation": {}
        }));

        assert!(order.display_amount().is_none());
    }

    #[test]
    fn test_display_amount_is_absent_for_empty_order() {
        let order = OrderRequest::new(json!({}));

        assert!(order.display_amount().is_none());
    }

    #[test]
    fn test_display_amount_tolerates_mistyped_order_information() {
        let order = OrderRequest::new(json!({
            "orderInformation": "not an object"
        }));

        assert!(order.display_amount().is_none());
    }

    #[test]
    fn test_display_amount_tolerates_mistyped_total() {
        let order = OrderRequest::new(json!({
            "orderInformation": {
                "amountDetails": {"totalAmount": ["42.50"]}
            }
        }));

        assert!(order.display_amount().is_none());
    }

    #[test]
    fn test_from_json_file_rejects_missing_file() {
        let result = OrderRequest::from_json_file(Path::new("/nonexistent/order.json"));

        assert!(matches!(result, Err(ConfigError::InvalidOrderRequest(_))));
    }

    #[test]
    fn test_from_json_file_loads_and_reads_amount() {
        let path = std::env::temp_dir().join(format!(
            "checkout-order-valid-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"orderInformation": {"amountDetails": {"totalAmount": "42.50"}}}"#,
        )
        .unwrap();

        let order = OrderRequest::from_json_file(&path).unwrap();
        assert_eq!(order.display_amount().as_deref(), Some("42.50"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_from_json_file_rejects_non_object_body() {
        let path = std::env::temp_dir().join(format!(
            "checkout-order-array-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"["not", "an", "object"]"#).unwrap();

        let result = OrderRequest::from_json_file(&path);
        assert!(matches!(result, Err(ConfigError::InvalidOrderRequest(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_checkout_response_omits_absent_library_fields() {
        let response = CheckoutResponse {
            capture_context: "token".to_string(),
            client_library: None,
            client_library_integrity: None,
            total_amount: "0.01".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["capture_context"], "token");
        assert_eq!(value["total_amount"], "0.01");
        assert!(value.get("client_library").is_none());
        assert!(value.get("client_library_integrity").is_none());
    }

    #[test]
    fn test_checkout_response_includes_present_library_fields() {
        let response = CheckoutResponse {
            capture_context: "token".to_string(),
            client_library: Some("https://example.com/lib.js".to_string()),
            client_library_integrity: Some("sha256-aGFzaA".to_string()),
            total_amount: "42.50".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["client_library"], "https://example.com/lib.js");
        assert_eq!(value["client_library_integrity"], "sha256-aGFzaA");
    }
}
