//! Token verifier implementations.

pub mod jwt;

pub use jwt::JwtVerifier;
