//! Capture-context token verification.
//!
//! The gateway returns the capture context as an RS256-signed JWT. This
//! module owns the full trust pipeline: resolving the verification key
//! from the gateway ([`keys`]), checking the token structure and
//! signature ([`verify`]), and pulling the client-library claims out of
//! the verified payload ([`claims`]).

pub mod claims;
pub mod keys;
pub mod verify;

pub use claims::{extract_client_library, ClientLibraryClaims};
pub use keys::PublicKeyClient;
pub use verify::TokenVerifier;
