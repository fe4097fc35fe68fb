//! HS256 JWT verifier.
//!
//! Tokens carry `sub` (the display name), `iat` and `exp`. Issuing is only
//! used by the `--issue-token` development aid; the session path only
//! verifies.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{TokenClaims, TokenVerifier, VerifyError};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtVerifier {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, VerifyError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| VerifyError::Issue(e.to_string()))
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, VerifyError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
                _ => VerifyError::Malformed(err.to_string()),
            }
        })?;

        Ok(TokenClaims {
            subject: data.claims.sub,
            expires_at: data.claims.exp,
        })
    }

    fn issue(&self, subject: &str) -> Result<String, VerifyError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-0123456789abcdef";

    #[test]
    fn test_issued_token_verifies() {
        // テスト項目: 発行したトークンが検証でき、subject が取り出せる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS);
        let token = verifier.issue("alice").unwrap();

        // when (操作):
        let claims = verifier.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(claims.subject, "alice");
        assert!(claims.expires_at > Utc::now().timestamp());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // テスト項目: 期限切れトークンは Expired になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS);
        let now = Utc::now().timestamp();
        let token = verifier
            .sign(&Claims {
                sub: "alice".to_string(),
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(VerifyError::Expired));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        // テスト項目: 別の鍵で署名されたトークンは InvalidSignature になる
        // given (前提条件):
        let issuer = JwtVerifier::new(b"another-secret-another-secret-00", DEFAULT_TOKEN_TTL_SECS);
        let verifier = JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS);
        let token = issuer.issue("mallory").unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        // テスト項目: トークン形式でない入力は Malformed になる
        // given (前提条件):
        let verifier = JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS);

        // when (操作):
        let result = verifier.verify("not-a-token");

        // then (期待する結果):
        assert!(matches!(result, Err(VerifyError::Malformed(_))));
    }
}
