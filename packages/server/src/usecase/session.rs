//! UseCase: per-connection session loop.
//!
//! ```text
//! Connecting -> Authenticating -> Active -> Closed
//!                     |                       ^
//!                     +-----------------------+  (rejected / handshake read failed)
//! ```
//!
//! The loop is transport-agnostic: it reads text frames from any `Stream`
//! and writes through a [`PusherChannel`]. The WebSocket handler adapts the
//! socket to both.

use std::{fmt, sync::Arc, time::Duration};

use futures_util::{Stream, StreamExt};
use tokio::sync::watch;

use crate::domain::{ConnectionId, Identity, PusherChannel, RejectReason};

use super::{
    authenticate::IdentityGate, connect_participant::ConnectParticipantUseCase,
    disconnect_participant::DisconnectParticipantUseCase, send_message::SendMessageUseCase,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Active(Identity),
    Closed,
}

/// Why a session stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseCause {
    RemoteClosed,
    TransportError(String),
    IdleTimeout,
    Shutdown,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The first read failed; the connection never reached the gate.
    HandshakeFailed(CloseCause),
    /// The gate (or the registry's name check) refused the connection.
    Rejected(RejectReason),
    /// The session was Active and has been torn down.
    Ended { identity: Identity, cause: CloseCause },
}

enum Read {
    Frame(String),
    Closed(CloseCause),
}

/// Drives every connection through its lifecycle.
pub struct SessionLoop {
    gate: Arc<IdentityGate>,
    connect: Arc<ConnectParticipantUseCase>,
    disconnect: Arc<DisconnectParticipantUseCase>,
    send_message: Arc<SendMessageUseCase>,
    idle_timeout: Option<Duration>,
    shutdown: watch::Receiver<bool>,
}

impl SessionLoop {
    pub fn new(
        gate: Arc<IdentityGate>,
        connect: Arc<ConnectParticipantUseCase>,
        disconnect: Arc<DisconnectParticipantUseCase>,
        send_message: Arc<SendMessageUseCase>,
        idle_timeout: Option<Duration>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            gate,
            connect,
            disconnect,
            send_message,
            idle_timeout,
            shutdown,
        }
    }

    /// Run one connection from handshake to teardown.
    ///
    /// `outbound` is dropped when this returns; once the registry has
    /// released its clone the connection's pusher task drains and stops.
    pub async fn run<S, E>(&self, mut frames: S, outbound: PusherChannel) -> SessionOutcome
    where
        S: Stream<Item = Result<String, E>> + Unpin,
        E: fmt::Display,
    {
        let id = ConnectionId::generate();
        let mut shutdown = self.shutdown.clone();
        let mut state = SessionState::Connecting;
        transition(id, &mut state, SessionState::Authenticating);

        // Authenticating: exactly one frame is consumed.
        let first_frame = match self.next_frame(&mut frames, &mut shutdown).await {
            Read::Frame(frame) => frame,
            Read::Closed(cause) => {
                tracing::info!(connection = %id, ?cause, "connection closed before authenticating");
                transition(id, &mut state, SessionState::Closed);
                return SessionOutcome::HandshakeFailed(cause);
            }
        };

        let identity = match self.admit(id, &first_frame, &outbound).await {
            Ok(identity) => identity,
            Err(reason) => {
                tracing::warn!(connection = %id, %reason, "authentication rejected");
                if outbound.try_send(format!("Authentication failed: {}", reason)).is_err() {
                    tracing::debug!(connection = %id, "could not deliver rejection notice");
                }
                transition(id, &mut state, SessionState::Closed);
                return SessionOutcome::Rejected(reason);
            }
        };
        transition(id, &mut state, SessionState::Active(identity.clone()));

        // Active: read, transform, submit until the transport goes away.
        let cause = loop {
            match self.next_frame(&mut frames, &mut shutdown).await {
                Read::Frame(frame) => {
                    if let Err(e) = self.send_message.execute(&identity, &frame).await {
                        tracing::debug!(connection = %id, "dropped inbound frame: {}", e);
                    }
                }
                Read::Closed(cause) => break cause,
            }
        };

        tracing::info!(connection = %id, name = %identity.name, ?cause, "session closing");
        self.disconnect.execute(id, &identity).await;
        transition(id, &mut state, SessionState::Closed);

        SessionOutcome::Ended { identity, cause }
    }

    /// Gate check followed by registration; both failures end the session
    /// without a registry entry.
    async fn admit(
        &self,
        id: ConnectionId,
        first_frame: &str,
        outbound: &PusherChannel,
    ) -> Result<Identity, RejectReason> {
        let identity = self.gate.authenticate(first_frame).await?;
        self.connect
            .execute(id, identity.clone(), outbound.clone())
            .await?;
        Ok(identity)
    }

    async fn next_frame<S, E>(&self, frames: &mut S, shutdown: &mut watch::Receiver<bool>) -> Read
    where
        S: Stream<Item = Result<String, E>> + Unpin,
        E: fmt::Display,
    {
        let read = async {
            match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, frames.next()).await.ok(),
                None => Some(frames.next().await),
            }
        };

        // A dropped sender means shutdown can no longer be requested.
        let stop = async {
            if shutdown.wait_for(|stop| *stop).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            _ = stop => Read::Closed(CloseCause::Shutdown),
            result = read => match result {
                None => Read::Closed(CloseCause::IdleTimeout),
                Some(None) => Read::Closed(CloseCause::RemoteClosed),
                Some(Some(Err(e))) => Read::Closed(CloseCause::TransportError(e.to_string())),
                Some(Some(Ok(frame))) => Read::Frame(frame),
            },
        }
    }
}

fn transition(id: ConnectionId, state: &mut SessionState, next: SessionState) {
    tracing::debug!(connection = %id, from = ?state, to = ?next, "session state");
    *state = next;
}
