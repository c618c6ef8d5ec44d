//! Outbound gateway clients and the checkout orchestration.

pub mod capture_context;
pub mod gateway;
pub mod signature;

pub use capture_context::{CaptureContext, CaptureContextService};
pub use gateway::GatewayClient;
pub use signature::RequestSigner;
