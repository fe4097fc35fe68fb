//! Message store trait.
//!
//! The broadcast core only needs two operations from durable storage:
//! append one record and fetch the most recent ones. Implementations live in
//! the infrastructure layer.

use async_trait::async_trait;

use super::{DisplayName, MessageBody, MessageRecord, StoreError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist one user message. The store assigns `created_at`.
    async fn append(&self, author: &DisplayName, body: &MessageBody) -> Result<(), StoreError>;

    /// Fetch up to `limit` records, newest first.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<MessageRecord>, StoreError>;
}
