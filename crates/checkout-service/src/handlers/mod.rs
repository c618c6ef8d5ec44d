//! HTTP request handlers.

pub mod checkout;
pub mod health;

pub use checkout::checkout;
pub use health::health_check;
