//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use crate::infrastructure::dispatcher::DispatchLoop;

use super::{
    handler::{active_users, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Broadcast chat server
///
/// Owns the dispatch loop until it is started, and the sending half of the
/// shutdown signal every session listens on.
///
/// # Example
///
/// ```ignore
/// let server = agora_server::app::build(&config)?;
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    dispatch_loop: DispatchLoop,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    pub fn new(
        state: Arc<AppState>,
        dispatch_loop: DispatchLoop,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            state,
            dispatch_loop,
            shutdown_tx,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/users", get(active_users))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the chat server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }

    /// Serve on an already-bound listener until `signal` resolves.
    ///
    /// When the signal fires every session is told to close, so each one
    /// runs its normal teardown before the listener stops.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let dispatch_task = tokio::spawn(self.dispatch_loop.run());
        let shutdown_tx = self.shutdown_tx;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                if shutdown_tx.send(true).is_err() {
                    tracing::debug!("No session is listening for shutdown");
                }
            })
            .await?;

        // Sessions still flushing their leave notices keep dispatcher
        // handles alive; the loop is not awaited past this point.
        dispatch_task.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
