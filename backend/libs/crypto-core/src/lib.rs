//! Shared token primitives for the storefront services.
//!
//! - `jwt`: HS256 token codec (mint/parse) and the request-path validator
//! - `secret`: strength check for the shared signing secret

pub mod jwt;
pub mod secret;

pub use jwt::{Claims, TokenCodec, TokenError, TokenValidator};
pub use secret::{validate_secret_strength, SecretStrength};
