//! UseCase: 参加者切断処理
//!
//! Teardown of an Active session: unregister, announce the leave, publish
//! presence. Safe to run after the dispatcher already evicted the handle.

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Identity},
    infrastructure::{dispatcher::Dispatcher, dto::text::leave_notice, registry::ConnectionRegistry},
};

use super::publish_presence::PresencePublisher;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
    presence: Arc<PresencePublisher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        dispatcher: Dispatcher,
        presence: Arc<PresencePublisher>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            presence,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// `true` if the handle was still registered, `false` if it had already
    /// been removed (e.g. evicted by the dispatcher).
    pub async fn execute(&self, id: ConnectionId, identity: &Identity) -> bool {
        let was_registered = self.registry.unregister(&id).await.is_some();
        tracing::info!(
            connection = %id,
            name = %identity.name,
            was_registered,
            "participant left"
        );

        if let Err(e) = self.dispatcher.submit(leave_notice(&identity.name)).await {
            tracing::warn!("Failed to submit leave notice for '{}': {}", identity.name, e);
        }
        if let Err(e) = self.presence.publish().await {
            tracing::warn!("Failed to publish presence: {}", e);
        }

        was_registered
    }
}
