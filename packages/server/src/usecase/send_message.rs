//! UseCase: メッセージ送信処理
//!
//! Active -> Active: transform the frame, stamp it, then persist and submit
//! concurrently. The structured `{author, body}` pair is carried to the
//! store as-is; nothing is re-parsed from the formatted line.

use std::sync::Arc;

use agora_shared::time::Clock;

use crate::{
    domain::{Identity, MessageBody, MessageRecord, MessageStore, TextTransform, Timestamp},
    infrastructure::{dispatcher::Dispatcher, dto::text::ChatLineFormatter},
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    store: Arc<dyn MessageStore>,
    dispatcher: Dispatcher,
    transform: Arc<dyn TextTransform>,
    clock: Arc<dyn Clock>,
    formatter: ChatLineFormatter,
}

impl SendMessageUseCase {
    pub fn new(
        store: Arc<dyn MessageStore>,
        dispatcher: Dispatcher,
        transform: Arc<dyn TextTransform>,
        clock: Arc<dyn Clock>,
        formatter: ChatLineFormatter,
    ) -> Self {
        Self {
            store,
            dispatcher,
            transform,
            clock,
            formatter,
        }
    }

    /// メッセージ送信を実行
    ///
    /// A store failure is logged and does not fail the call; a submit
    /// failure does.
    pub async fn execute(
        &self,
        author: &Identity,
        frame: &str,
    ) -> Result<MessageRecord, SendMessageError> {
        let body = MessageBody::new(self.transform.transform(frame))?;
        let record = MessageRecord::new(
            author.name.clone(),
            body,
            Timestamp::new(self.clock.now_millis()),
        );
        let line = self.formatter.format_record(&record);

        let (persisted, submitted) = tokio::join!(
            self.store.append(&record.author, &record.body),
            self.dispatcher.submit(line),
        );

        if let Err(e) = persisted {
            tracing::warn!("Failed to persist message from '{}': {}", record.author, e);
        }
        submitted?;

        tracing::debug!(name = %record.author, "message submitted");
        Ok(record)
    }
}
