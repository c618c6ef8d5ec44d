//! # Checkout Test Utilities
//!
//! Shared test utilities for the checkout service.
//!
//! This crate provides:
//! - RSA key fixtures for signing and serving verification keys
//! - Token builders for capture-context payloads (CaptureContextTokenBuilder)
//! - Server test harness (TestCheckoutServer for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use checkout_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestCheckoutServer::spawn().await?;
//!     server.mount_public_key().await;
//!
//!     let token = CaptureContextTokenBuilder::new().sign(server.signing_key())?;
//!     server.mount_capture_context(201, &token).await;
//!
//!     let response = reqwest::get(&format!("{}/v1/checkout", server.url())).await?;
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
