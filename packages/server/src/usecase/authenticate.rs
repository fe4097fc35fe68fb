//! UseCase: identity gate.
//!
//! Consumes exactly one frame and turns it into an [`Identity`] or a
//! [`RejectReason`]. No retries: the caller closes the connection on
//! rejection.

use std::sync::Arc;

use crate::{
    domain::{DisplayName, Identity, RejectReason, TokenVerifier},
    infrastructure::registry::{ConnectionRegistry, NamePolicy},
};

enum GatePolicy {
    /// First frame is the display name.
    TrustFirstFrame,
    /// First frame is a signed token whose subject becomes the display name.
    VerifiedToken(Arc<dyn TokenVerifier>),
}

pub struct IdentityGate {
    policy: GatePolicy,
    registry: Arc<ConnectionRegistry>,
}

impl IdentityGate {
    pub fn trust_first_frame(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            policy: GatePolicy::TrustFirstFrame,
            registry,
        }
    }

    pub fn verified_token(registry: Arc<ConnectionRegistry>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            policy: GatePolicy::VerifiedToken(verifier),
            registry,
        }
    }

    /// Validate the first frame of a connection.
    ///
    /// The name check done here is advisory; `ConnectionRegistry::register`
    /// repeats it atomically with the insert.
    pub async fn authenticate(&self, first_frame: &str) -> Result<Identity, RejectReason> {
        match &self.policy {
            GatePolicy::TrustFirstFrame => {
                let name = DisplayName::new(first_frame.to_string())
                    .map_err(|_| RejectReason::EmptyName)?;

                if self.registry.policy() == NamePolicy::Unique
                    && self.registry.is_name_taken(&name).await
                {
                    return Err(RejectReason::DuplicateName(name.into_string()));
                }

                Ok(Identity::claimed(name))
            }
            GatePolicy::VerifiedToken(verifier) => {
                let claims = verifier.verify(first_frame.trim())?;
                let name = DisplayName::new(claims.subject.clone())
                    .map_err(|_| RejectReason::MalformedToken)?;
                Ok(Identity::verified(name, claims.subject))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::ConnectionId,
        infrastructure::verifier::{JwtVerifier, jwt::DEFAULT_TOKEN_TTL_SECS},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - trust-first-frame: 空名拒否、重複名拒否（Unique 時のみ）
    // - verified-token: 正当なトークンの受理、不正・期限切れトークンの拒否
    // ========================================

    const SECRET: &[u8] = b"gate-test-secret-gate-test-secret";

    async fn register(registry: &ConnectionRegistry, name: &str) {
        let (tx, _rx) = mpsc::channel(64);
        registry
            .register(
                ConnectionId::generate(),
                Identity::claimed(DisplayName::new(name.to_string()).unwrap()),
                tx,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_trust_first_frame_accepts_name() {
        // テスト項目: 最初のフレームがそのまま表示名になる
        // given (前提条件):
        let gate = IdentityGate::trust_first_frame(Arc::new(ConnectionRegistry::new(NamePolicy::Unique)));

        // when (操作):
        let identity = gate.authenticate("alice").await.unwrap();

        // then (期待する結果):
        assert_eq!(identity.name.as_str(), "alice");
        assert_eq!(identity.subject, None);
    }

    #[tokio::test]
    async fn test_trust_first_frame_rejects_blank_name() {
        // テスト項目: 空白のみのフレームは EmptyName で拒否される
        // given (前提条件):
        let gate = IdentityGate::trust_first_frame(Arc::new(ConnectionRegistry::new(NamePolicy::Unique)));

        // when (操作):
        let result = gate.authenticate("   ").await;

        // then (期待する結果):
        assert_eq!(result, Err(RejectReason::EmptyName));
    }

    #[tokio::test]
    async fn test_trust_first_frame_rejects_taken_name_under_unique_policy() {
        // テスト項目: Unique ポリシーで既に使われている名前は拒否される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new(NamePolicy::Unique));
        register(&registry, "alice").await;
        let gate = IdentityGate::trust_first_frame(registry);

        // when (操作):
        let result = gate.authenticate("alice").await;

        // then (期待する結果):
        assert_eq!(result, Err(RejectReason::DuplicateName("alice".to_string())));
    }

    #[tokio::test]
    async fn test_trust_first_frame_allows_taken_name_when_duplicates_allowed() {
        // テスト項目: AllowDuplicates ポリシーでは同名でも受理される
        // given (前提条件):
        let registry = Arc::new(ConnectionRegistry::new(NamePolicy::AllowDuplicates));
        register(&registry, "alice").await;
        let gate = IdentityGate::trust_first_frame(registry);

        // when (操作):
        let result = gate.authenticate("alice").await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verified_token_accepts_valid_token() {
        // テスト項目: 正当なトークンの subject が表示名になる
        // given (前提条件):
        let verifier = Arc::new(JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS));
        let token = verifier.issue("alice").unwrap();
        let gate = IdentityGate::verified_token(
            Arc::new(ConnectionRegistry::new(NamePolicy::AllowDuplicates)),
            verifier,
        );

        // when (操作):
        let identity = gate.authenticate(&format!("{token}\n")).await.unwrap();

        // then (期待する結果):
        assert_eq!(identity.name.as_str(), "alice");
        assert_eq!(identity.subject.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_verified_token_rejects_forged_token() {
        // テスト項目: 別の鍵で署名されたトークンは InvalidToken で拒否される
        // given (前提条件):
        let forged = JwtVerifier::new(b"forged-secret-forged-secret-0000", DEFAULT_TOKEN_TTL_SECS)
            .issue("alice")
            .unwrap();
        let gate = IdentityGate::verified_token(
            Arc::new(ConnectionRegistry::new(NamePolicy::AllowDuplicates)),
            Arc::new(JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS)),
        );

        // when (操作):
        let result = gate.authenticate(&forged).await;

        // then (期待する結果):
        assert_eq!(result, Err(RejectReason::InvalidToken));
    }

    #[tokio::test]
    async fn test_verified_token_rejects_plain_name() {
        // テスト項目: トークンポリシーで名前だけ送ると MalformedToken で拒否される
        // given (前提条件):
        let gate = IdentityGate::verified_token(
            Arc::new(ConnectionRegistry::new(NamePolicy::AllowDuplicates)),
            Arc::new(JwtVerifier::new(SECRET, DEFAULT_TOKEN_TTL_SECS)),
        );

        // when (操作):
        let result = gate.authenticate("alice").await;

        // then (期待する結果):
        assert_eq!(result, Err(RejectReason::MalformedToken));
    }
}
