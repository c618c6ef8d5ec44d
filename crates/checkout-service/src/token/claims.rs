//! Client-library claims extraction.
//!
//! A verified capture context may point the storefront at a browser
//! library (and its subresource integrity hash) under
//! `ctx[0].data.clientLibrary` / `clientLibraryIntegrity`. Both claims
//! are optional: a token without them is still a usable capture context,
//! so extraction only fails when the payload itself is malformed.

use serde::{Deserialize, Serialize};

use crate::errors::CheckoutError;

/// Client-library pointers from a verified capture context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLibraryClaims {
    /// URL of the gateway's browser library.
    pub client_library: Option<String>,
    /// Subresource integrity hash for the library.
    pub client_library_integrity: Option<String>,
}

impl ClientLibraryClaims {
    /// True when the token carried neither claim.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.client_library.is_none() && self.client_library_integrity.is_none()
    }
}

/// Payload fields relevant to claim extraction. Everything else in the
/// token is ignored.
///
/// `ctx` must be an array when present. Its entries are decoded leniently
/// below: a mistyped entry degrades to absent claims rather than failing
/// a token the gateway legitimately signed.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    #[serde(default)]
    ctx: Option<Vec<serde_json::Value>>,
}

/// One entry of the token's `ctx` array.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContextEntry {
    data: Option<ContextData>,
}

/// The `data` object of a context entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ContextData {
    #[serde(deserialize_with = "lenient_string")]
    client_library: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    client_library_integrity: Option<String>,
}

/// Accept a string, treat any other type as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(ToString::to_string))
}

/// Extract client-library claims from verified payload bytes.
///
/// # Errors
///
/// Returns [`CheckoutError::PayloadParse`] if the payload is not a JSON
/// object or its `ctx` field is present but not an array. Absent or
/// empty `ctx`, or entries without usable claims, yield empty claims.
pub fn extract_client_library(payload: &[u8]) -> Result<ClientLibraryClaims, CheckoutError> {
    let value: serde_json::Value = serde_json::from_slice(payload).map_err(|e| {
        CheckoutError::PayloadParse(format!("capture context payload: {e}"))
    })?;

    // serde derives structs from JSON arrays too, so the object shape
    // has to be checked on the raw value before typed decoding.
    if !value.is_object() {
        return Err(CheckoutError::PayloadParse(
            "capture context payload is not a JSON object".to_string(),
        ));
    }

    let payload = TokenPayload::deserialize(&value).map_err(|e| {
        CheckoutError::PayloadParse(format!("capture context payload: {e}"))
    })?;

    let claims = payload
        .ctx
        .as_ref()
        .and_then(|entries| entries.first())
        .and_then(|entry| ContextEntry::deserialize(entry).ok())
        .and_then(|entry| entry.data)
        .map(|data| ClientLibraryClaims {
            client_library: data.client_library,
            client_library_integrity: data.client_library_integrity,
        })
        .unwrap_or_default();

    if claims.is_empty() {
        tracing::debug!(
            target: "checkout.token.claims",
            "capture context carries no client library claims"
        );
    }

    Ok(claims)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Payload shaped like a real capture context, claims included.
    fn full_payload() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "flx": {
                "path": "/flex/v2/tokens",
                "origin": "https://testflex.cybersource.com",
            },
            "ctx": [
                {
                    "data": {
                        "clientLibrary": "https://testflex.cybersource.com/microform/bundle/v2/flex-microform.min.js",
                        "clientLibraryIntegrity": "sha256-ZHNsZmtqc2RmbGtqc2RmbGtqc2RmbGtqc2Rm",
                        "targetOrigins": ["https://storefront.example.com"],
                    },
                    "type": "mf-2.1.0",
                }
            ],
            "iss": "Flex API",
            "exp": 1_755_862_000,
            "iat": 1_755_861_100,
            "jti": "FXT-1755861100",
        }))
        .unwrap()
    }

    #[test]
    fn test_extracts_both_claims() {
        let claims = extract_client_library(&full_payload()).unwrap();

        assert_eq!(
            claims.client_library.as_deref(),
            Some("https://testflex.cybersource.com/microform/bundle/v2/flex-microform.min.js")
        );
        assert_eq!(
            claims.client_library_integrity.as_deref(),
            Some("sha256-ZHNsZmtqc2RmbGtqc2RmbGtqc2RmbGtqc2Rm")
        );
        assert!(!claims.is_empty());
    }

    #[test]
    fn test_library_without_integrity_leaves_integrity_absent() {
        let payload = serde_json::to_vec(&json!({
            "ctx": [{"data": {"clientLibrary": "https://example.com/lib.js"}}],
        }))
        .unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert_eq!(claims.client_library.as_deref(), Some("https://example.com/lib.js"));
        assert!(claims.client_library_integrity.is_none());
    }

    #[test]
    fn test_absent_ctx_yields_empty_claims() {
        let payload = serde_json::to_vec(&json!({"iss": "Flex API"})).unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.is_empty());
    }

    #[test]
    fn test_null_ctx_yields_empty_claims() {
        let payload = serde_json::to_vec(&json!({"ctx": null})).unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.is_empty());
    }

    #[test]
    fn test_empty_ctx_array_yields_empty_claims() {
        let payload = serde_json::to_vec(&json!({"ctx": []})).unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.is_empty());
    }

    #[test]
    fn test_ctx_that_is_not_an_array_is_a_parse_error() {
        let payload = serde_json::to_vec(&json!({"ctx": "unexpected"})).unwrap();

        let result = extract_client_library(&payload);

        assert!(matches!(result, Err(CheckoutError::PayloadParse(_))));
    }

    #[test]
    fn test_payload_that_is_not_json_is_a_parse_error() {
        let result = extract_client_library(b"definitely not json");

        assert!(matches!(result, Err(CheckoutError::PayloadParse(_))));
    }

    #[test]
    fn test_payload_that_is_not_an_object_is_a_parse_error() {
        // Arrays would otherwise satisfy serde's struct decoding, with
        // defaults filling the fields a short array leaves out.
        let payloads = [
            json!(["ctx"]),
            json!([]),
            json!([null]),
            json!([[{"data": {}}]]),
            json!("capture context"),
            json!(42),
            json!(null),
        ];

        for payload in payloads {
            let bytes = serde_json::to_vec(&payload).unwrap();

            let result = extract_client_library(&bytes);

            assert!(
                matches!(result, Err(CheckoutError::PayloadParse(_))),
                "payload {payload} must be a parse error"
            );
        }
    }

    #[test]
    fn test_non_object_first_entry_degrades_to_empty_claims() {
        let payload = serde_json::to_vec(&json!({"ctx": ["bare string"]})).unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.is_empty());
    }

    #[test]
    fn test_entry_without_data_degrades_to_empty_claims() {
        let payload = serde_json::to_vec(&json!({"ctx": [{"type": "mf-2.1.0"}]})).unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.is_empty());
    }

    #[test]
    fn test_mistyped_library_field_degrades_to_absent() {
        let payload = serde_json::to_vec(&json!({
            "ctx": [{"data": {
                "clientLibrary": 42,
                "clientLibraryIntegrity": "sha256-c3RpbGwtdmFsaWQ",
            }}],
        }))
        .unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert!(claims.client_library.is_none());
        assert_eq!(
            claims.client_library_integrity.as_deref(),
            Some("sha256-c3RpbGwtdmFsaWQ")
        );
    }

    #[test]
    fn test_only_the_first_context_entry_is_considered() {
        let payload = serde_json::to_vec(&json!({
            "ctx": [
                {"data": {"clientLibrary": "https://example.com/first.js"}},
                {"data": {"clientLibrary": "https://example.com/second.js"}},
            ],
        }))
        .unwrap();

        let claims = extract_client_library(&payload).unwrap();

        assert_eq!(
            claims.client_library.as_deref(),
            Some("https://example.com/first.js")
        );
    }
}
