//! Token verifier trait used by the verified-token gate policy.

use super::VerifyError;

/// Claims recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    /// Expiry as Unix seconds.
    pub expires_at: i64,
}

pub trait TokenVerifier: Send + Sync {
    /// Check signature and expiry, returning the claims on success.
    fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError>;

    /// Sign a fresh token for `subject`.
    fn issue(&self, subject: &str) -> Result<String, VerifyError>;
}
