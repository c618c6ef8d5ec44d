//! Checkout capture-context service.
//!
//! A storefront-facing HTTP service that prepares everything a hosted
//! checkout page needs to accept a payment. For each checkout it submits
//! the server-held order to the payment gateway, receives a capture
//! context as an RS256-signed JWT, verifies that token against the key
//! the gateway publishes for it, and returns the token together with the
//! gateway's client-library claims and the order total to display.
//!
//! The gateway's word is never taken on trust: a capture context that
//! fails verification fails the checkout.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod token;
