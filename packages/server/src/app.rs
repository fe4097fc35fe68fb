//! Composition root: turns a validated [`ServerConfig`] into a runnable [`Server`].

use std::sync::Arc;

use agora_shared::time::{Clock, SystemClock};
use tokio::sync::watch;

use crate::{
    config::{AuthPolicyKind, ConfigError, ServerConfig, StoreKind},
    domain::{MessageStore, StoreError, TextTransform, TokenVerifier, VerifyError},
    infrastructure::{
        dispatcher::dispatch_channel,
        dto::text::ChatLineFormatter,
        registry::ConnectionRegistry,
        store::{InMemoryMessageStore, SqliteMessageStore},
        transform::{EmojiTransform, PlainTransform},
        verifier::JwtVerifier,
    },
    ui::{Server, state::AppState},
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, IdentityGate, PresencePublisher,
        SendMessageUseCase, SessionLoop,
    },
};

#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open message store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to issue token: {0}")]
    Token(#[from] VerifyError),
}

/// Wire every component described by `config`.
///
/// The only I/O done here is opening the message store.
pub fn build(config: &ServerConfig) -> Result<Server, StartupError> {
    config.validate()?;

    // Initialize dependencies in order:
    // 1. Clock and Registry
    // 2. Dispatcher
    // 3. MessageStore
    // 4. IdentityGate
    // 5. UseCases
    // 6. SessionLoop
    // 7. AppState and Server

    // 1. Clock and Registry
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(ConnectionRegistry::new(config.name_policy()));

    // 2. Dispatcher (bounded queue + single drain loop)
    let (dispatcher, dispatch_loop) = dispatch_channel(
        registry.clone(),
        config.queue_capacity,
        config.backpressure,
        clock.clone(),
    );
    tracing::info!(
        "Dispatch queue ready (capacity {}, {:?} when full)",
        config.queue_capacity,
        config.backpressure
    );

    // 3. MessageStore
    let store: Arc<dyn MessageStore> = match config.store {
        StoreKind::Memory => Arc::new(InMemoryMessageStore::new(
            clock.clone(),
            config.history_limit,
        )),
        StoreKind::Sqlite => Arc::new(SqliteMessageStore::open(
            &config.database_path,
            config.history_column,
            clock.clone(),
        )?),
    };

    // 4. IdentityGate
    let gate = match config.auth_policy {
        AuthPolicyKind::TrustFirstFrame => IdentityGate::trust_first_frame(registry.clone()),
        AuthPolicyKind::VerifiedToken => {
            IdentityGate::verified_token(registry.clone(), jwt_verifier(config)?)
        }
    };

    // 5. UseCases
    let formatter = ChatLineFormatter::new(config.show_timestamps);
    let transform: Arc<dyn TextTransform> = if config.emoji {
        Arc::new(EmojiTransform::default())
    } else {
        Arc::new(PlainTransform)
    };
    let presence = Arc::new(PresencePublisher::new(registry.clone(), dispatcher.clone()));
    let connect = Arc::new(ConnectParticipantUseCase::new(
        registry.clone(),
        dispatcher.clone(),
        store.clone(),
        presence.clone(),
        formatter,
        config.history_limit,
    ));
    let disconnect = Arc::new(DisconnectParticipantUseCase::new(
        registry,
        dispatcher.clone(),
        presence.clone(),
    ));
    let send_message = Arc::new(SendMessageUseCase::new(
        store, dispatcher, transform, clock, formatter,
    ));

    // 6. SessionLoop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let session_loop = Arc::new(SessionLoop::new(
        Arc::new(gate),
        connect,
        disconnect,
        send_message,
        config.idle_timeout(),
        shutdown_rx,
    ));

    // 7. AppState and Server
    let state = Arc::new(AppState {
        session_loop,
        presence,
        client_buffer: config.client_buffer,
    });
    Ok(Server::new(state, dispatch_loop, shutdown_tx))
}

/// Sign a token for `subject` with the configured secret and TTL.
pub fn issue_token(config: &ServerConfig, subject: &str) -> Result<String, StartupError> {
    config.validate()?;
    Ok(jwt_verifier(config)?.issue(subject)?)
}

fn jwt_verifier(config: &ServerConfig) -> Result<Arc<dyn TokenVerifier>, ConfigError> {
    let secret = config
        .jwt_secret
        .as_deref()
        .filter(|secret| !secret.is_empty())
        .ok_or(ConfigError::MissingJwtSecret)?;
    Ok(Arc::new(JwtVerifier::new(
        secret.as_bytes(),
        config.token_ttl_secs,
    )))
}
