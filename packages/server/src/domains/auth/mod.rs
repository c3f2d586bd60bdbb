//! Auth domain - turns identity-provider tokens into requester context
//!
//! Token issuance lives with the identity provider; this side only verifies.

pub mod jwt;

pub use jwt::{Claims, JwtService};
