//! Domain entities.

use super::value_object::{DisplayName, MessageBody, Timestamp};

/// Identity bound to a connection once it passes the identity gate.
///
/// Immutable for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: DisplayName,
    /// Token subject, present only for token-authenticated connections.
    pub subject: Option<String>,
}

impl Identity {
    /// Identity claimed by a first-frame username.
    pub fn claimed(name: DisplayName) -> Self {
        Self {
            name,
            subject: None,
        }
    }

    /// Identity backed by a verified token subject.
    pub fn verified(name: DisplayName, subject: String) -> Self {
        Self {
            name,
            subject: Some(subject),
        }
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub author: DisplayName,
    pub body: MessageBody,
    pub created_at: Timestamp,
}

impl MessageRecord {
    pub fn new(author: DisplayName, body: MessageBody, created_at: Timestamp) -> Self {
        Self {
            author,
            body,
            created_at,
        }
    }
}

/// One already-formatted frame waiting in the dispatch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastItem {
    pub payload: String,
    pub submitted_at: Timestamp,
}

impl BroadcastItem {
    pub fn new(payload: String, submitted_at: Timestamp) -> Self {
        Self {
            payload,
            submitted_at,
        }
    }
}
