//! UseCase error types.

use thiserror::Error;

use crate::domain::{RejectReason, SubmitError, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("display name '{0}' is already connected")]
    DuplicateName(String),
}

impl From<ConnectError> for RejectReason {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::DuplicateName(name) => RejectReason::DuplicateName(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("message rejected: {0}")]
    InvalidBody(#[from] ValueObjectError),

    #[error("broadcast failed: {0}")]
    Submit(#[from] SubmitError),
}
