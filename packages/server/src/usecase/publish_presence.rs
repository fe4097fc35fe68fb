//! UseCase: presence publication.

use std::sync::Arc;

use crate::{
    domain::{DisplayName, SubmitError},
    infrastructure::{
        dispatcher::Dispatcher, dto::websocket::ActiveUsersMessage, registry::ConnectionRegistry,
    },
};

pub struct PresencePublisher {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
}

impl PresencePublisher {
    pub fn new(registry: Arc<ConnectionRegistry>, dispatcher: Dispatcher) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Current presence frame, names sorted.
    pub async fn current(&self) -> ActiveUsersMessage {
        let users = self
            .registry
            .display_names()
            .await
            .into_iter()
            .map(DisplayName::into_string)
            .collect();
        ActiveUsersMessage::new(users)
    }

    /// Render the live identity set and submit it as one broadcast item.
    pub async fn publish(&self) -> Result<ActiveUsersMessage, SubmitError> {
        let message = self.current().await;
        match serde_json::to_string(&message) {
            Ok(json) => self.dispatcher.submit(json).await?,
            Err(e) => tracing::error!("Failed to serialize presence: {}", e),
        }
        Ok(message)
    }
}
