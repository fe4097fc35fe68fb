//! UseCase: 参加者接続処理
//!
//! Entry into the Active state: register the connection, announce the join,
//! replay recent history to the newcomer, then publish presence.
//!
//! History is fetched newest first from the store and replayed oldest first.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Identity, MessageStore, PusherChannel, RegistryError},
    infrastructure::{
        dispatcher::Dispatcher,
        dto::text::{ChatLineFormatter, join_notice},
        registry::ConnectionRegistry,
    },
};

use super::{error::ConnectError, publish_presence::PresencePublisher};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
    store: Arc<dyn MessageStore>,
    presence: Arc<PresencePublisher>,
    formatter: ChatLineFormatter,
    history_limit: usize,
}

impl ConnectParticipantUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: Dispatcher,
        store: Arc<dyn MessageStore>,
        presence: Arc<PresencePublisher>,
        formatter: ChatLineFormatter,
        history_limit: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            store,
            presence,
            formatter,
            history_limit,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 登録成功（join 通知・履歴・プレゼンス送信済み）
    /// * `Err(ConnectError)` - 名前重複で登録できなかった（Registry は未変更）
    pub async fn execute(
        &self,
        id: ConnectionId,
        identity: Identity,
        sender: PusherChannel,
    ) -> Result<(), ConnectError> {
        // 1. Registry に登録（名前チェックと挿入は同一クリティカルセクション）
        self.registry
            .register(id, identity.clone(), sender.clone())
            .await
            .map_err(|RegistryError::NameTaken(name)| ConnectError::DuplicateName(name))?;
        tracing::info!(connection = %id, name = %identity.name, "participant joined");

        // 2. join 通知
        if let Err(e) = self.dispatcher.submit(join_notice(&identity.name)).await {
            tracing::warn!("Failed to submit join notice for '{}': {}", identity.name, e);
        }

        // 3. 履歴の再送
        let replayed = self.replay_history(&sender).await;
        tracing::debug!(connection = %id, replayed, "history replayed");

        // 4. プレゼンス更新
        if let Err(e) = self.presence.publish().await {
            tracing::warn!("Failed to publish presence: {}", e);
        }

        Ok(())
    }

    /// Send the most recent records to one connection, oldest first.
    ///
    /// Returns the number of frames written.
    pub async fn replay_history(&self, sender: &PusherChannel) -> usize {
        if self.history_limit == 0 {
            return 0;
        }

        let mut records = match self.store.fetch_recent(self.history_limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to fetch recent messages: {}", e);
                return 0;
            }
        };
        records.reverse();

        let mut sent = 0;
        for record in &records {
            if sender.try_send(self.formatter.format_record(record)).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }
}
