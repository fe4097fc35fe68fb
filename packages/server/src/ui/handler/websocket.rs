//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::{
    future,
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    ui::state::AppState,
    usecase::{CloseCause, SessionOutcome},
};

/// How long a closing session waits for its pusher to flush queued frames.
const PUSHER_DRAIN_GRACE: Duration = Duration::from_secs(2);

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when every sender is gone (registry entry removed and
/// session finished) or the socket write fails. It hands the sink back so
/// the caller can still send a close frame.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<SplitSink<WebSocket, Message>> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(msg.into())).await {
                tracing::debug!("WebSocket write failed: {}", e);
                break;
            }
        }
        sender
    })
}

/// Text and binary frames become session input; control frames are
/// handled by the protocol layer and skipped.
fn inbound_text(msg: Result<Message, axum::Error>) -> Option<Result<String, axum::Error>> {
    match msg {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
        Err(e) => Some(Err(e)),
    }
}

/// Close frame sent after the session ends, if the socket is still usable.
fn close_frame(outcome: &SessionOutcome) -> Option<CloseFrame> {
    let (code, reason) = match outcome {
        SessionOutcome::Rejected(reason) => (reason.close_code(), reason.to_string()),
        SessionOutcome::HandshakeFailed(cause) | SessionOutcome::Ended { cause, .. } => {
            match cause {
                CloseCause::RemoteClosed => (close_code::NORMAL, String::new()),
                CloseCause::IdleTimeout => (close_code::NORMAL, "idle timeout".to_string()),
                CloseCause::Shutdown => (close_code::AWAY, "server shutting down".to_string()),
                CloseCause::TransportError(_) => return None,
            }
        }
    };
    Some(CloseFrame {
        code,
        reason: reason.into(),
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // Outbound: everything written to this client goes through the channel.
    let (tx, rx) = mpsc::channel(state.client_buffer);
    let mut pusher = pusher_loop(rx, sender);

    // Inbound: a close frame ends the stream.
    let frames = Box::pin(
        receiver
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| future::ready(inbound_text(msg))),
    );

    let outcome = state.session_loop.run(frames, tx).await;
    tracing::debug!("Session finished: {:?}", outcome);

    let sender = match tokio::time::timeout(PUSHER_DRAIN_GRACE, &mut pusher).await {
        Ok(Ok(sender)) => Some(sender),
        Ok(Err(e)) => {
            tracing::warn!("Pusher task failed: {}", e);
            None
        }
        Err(_) => {
            tracing::warn!("Pusher did not drain in time, aborting");
            pusher.abort();
            None
        }
    };

    if let (Some(mut sender), Some(frame)) = (sender, close_frame(&outcome)) {
        if let Err(e) = sender.send(Message::Close(Some(frame))).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
    }
}
