//! Authentication for Taskgate
//!
//! Provides:
//! - JWT token issuance and validation
//! - Credential comparison for login
//! - The request guard that gates every protected operation

pub mod credentials;
pub mod jwt;
pub mod verifier;

pub use credentials::verify_password;
pub use jwt::{extract_bearer, Claims, JwtCodec, TokenError, TokenInput};
pub use verifier::authenticate;
