//! Domain error types.

use thiserror::Error;

/// Validation failures for value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("message body must not be empty")]
    EmptyMessageBody,

    #[error("message body is {actual} characters, limit is {max}")]
    MessageBodyTooLong { max: usize, actual: usize },
}

/// Why the identity gate refused a connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("display name must not be empty")]
    EmptyName,

    #[error("display name '{0}' is already in use")]
    DuplicateName(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("token signature is invalid")]
    InvalidToken,

    #[error("token is malformed")]
    MalformedToken,
}

impl RejectReason {
    /// WebSocket close code sent after the rejection notice.
    pub fn close_code(&self) -> u16 {
        match self {
            RejectReason::ExpiredToken => 4001,
            RejectReason::InvalidToken | RejectReason::MalformedToken => 4002,
            RejectReason::EmptyName => 4003,
            RejectReason::DuplicateName(_) => 4009,
        }
    }
}

impl From<VerifyError> for RejectReason {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Expired => RejectReason::ExpiredToken,
            VerifyError::InvalidSignature => RejectReason::InvalidToken,
            VerifyError::Malformed(_) | VerifyError::Issue(_) => RejectReason::MalformedToken,
        }
    }
}

/// Token verifier failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token has expired")]
    Expired,

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Connection registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("display name '{0}' is already registered")]
    NameTaken(String),
}

/// Message store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored record is invalid: {0}")]
    InvalidRecord(String),
}

/// Dispatch queue submission failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("dispatch queue is closed")]
    Closed,

    #[error("dispatch queue is full, item dropped")]
    QueueFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_errors_map_to_reject_reasons() {
        // テスト項目: 検証エラーが対応する拒否理由に変換される
        // given / when / then:
        assert_eq!(RejectReason::from(VerifyError::Expired), RejectReason::ExpiredToken);
        assert_eq!(
            RejectReason::from(VerifyError::InvalidSignature),
            RejectReason::InvalidToken
        );
        assert_eq!(
            RejectReason::from(VerifyError::Malformed("bad".to_string())),
            RejectReason::MalformedToken
        );
    }

    #[test]
    fn test_close_codes_are_distinct_per_category() {
        // テスト項目: 拒否理由ごとに close code が割り当てられる
        // then (期待する結果):
        assert_eq!(RejectReason::ExpiredToken.close_code(), 4001);
        assert_eq!(RejectReason::InvalidToken.close_code(), 4002);
        assert_eq!(RejectReason::MalformedToken.close_code(), 4002);
        assert_eq!(RejectReason::EmptyName.close_code(), 4003);
        assert_eq!(
            RejectReason::DuplicateName("alice".to_string()).close_code(),
            4009
        );
    }
}
