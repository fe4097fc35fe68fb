//! InMemory message store.
//!
//! Records live in a `VecDeque` in insertion order; `fetch_recent` walks it
//! from the back so results come back newest first, like the SQLite store.
//! Only the newest `retention` records are kept.

use std::{collections::VecDeque, sync::Arc};

use agora_shared::time::Clock;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DisplayName, MessageBody, MessageRecord, MessageStore, StoreError, Timestamp};

pub struct InMemoryMessageStore {
    records: Mutex<VecDeque<MessageRecord>>,
    retention: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    pub fn new(clock: Arc<dyn Clock>, retention: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(retention)),
            retention,
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, author: &DisplayName, body: &MessageBody) -> Result<(), StoreError> {
        let record = MessageRecord::new(
            author.clone(),
            body.clone(),
            Timestamp::new(self.clock.now_millis()),
        );
        if self.retention == 0 {
            return Ok(());
        }

        let mut records = self.records.lock().await;
        if records.len() == self.retention {
            records.pop_front();
        }
        records.push_back(record);
        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<MessageRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
