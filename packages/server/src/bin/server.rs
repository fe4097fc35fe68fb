//! Broadcast chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-server
//! cargo run --bin agora-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin agora-server -- --auth-policy verified-token --jwt-secret s3cret
//! cargo run --bin agora-server -- --jwt-secret s3cret --issue-token alice
//! ```

use agora_server::{app, config::ServerConfig};
use agora_shared::logger::setup_logger;
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(&[env!("CARGO_BIN_NAME"), "tower_http"], &config.log_level);

    if let Some(subject) = config.issue_token.as_deref() {
        match app::issue_token(&config, subject) {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let server = match app::build(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
