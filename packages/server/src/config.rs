//! Command-line and environment configuration.

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser, ValueEnum};

use crate::infrastructure::{
    dispatcher::BackpressurePolicy, registry::NamePolicy, store::HistoryColumn,
    verifier::jwt::DEFAULT_TOKEN_TTL_SECS,
};

/// How the first frame of a connection is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthPolicyKind {
    /// The first frame is the display name, taken on trust.
    TrustFirstFrame,
    /// The first frame is a signed token; its subject is the display name.
    VerifiedToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--auth-policy verified-token requires --jwt-secret")]
    MissingJwtSecret,

    #[error("--queue-capacity must be greater than zero")]
    ZeroQueueCapacity,

    #[error("--client-buffer must be greater than zero")]
    ZeroClientBuffer,

    #[error("--token-ttl-secs must be greater than zero")]
    NonPositiveTokenTtl,
}

/// Agora broadcast chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "agora-server", version)]
#[command(about = "Real-time text broadcast chat server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "AGORA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "AGORA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// How connections identify themselves
    #[arg(long, env = "AGORA_AUTH_POLICY", value_enum, default_value_t = AuthPolicyKind::TrustFirstFrame)]
    pub auth_policy: AuthPolicyKind,

    /// Reject a display name that is already online (trust-first-frame only;
    /// a verified token may reconnect while its earlier session is open)
    #[arg(long, env = "AGORA_UNIQUE_NAMES", default_value_t = true, action = ArgAction::Set)]
    pub unique_names: bool,

    /// HMAC secret for signed tokens
    #[arg(long, env = "AGORA_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Lifetime of issued tokens, in seconds
    #[arg(long, env = "AGORA_TOKEN_TTL_SECS", default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    pub token_ttl_secs: i64,

    /// Number of past messages replayed to a new participant
    #[arg(long, env = "AGORA_HISTORY_LIMIT", default_value_t = 10)]
    pub history_limit: usize,

    /// Append `[YYYY-MM-DD HH:MM:SS]` to chat lines
    #[arg(long, env = "AGORA_SHOW_TIMESTAMPS", default_value_t = true, action = ArgAction::Set)]
    pub show_timestamps: bool,

    /// Message store backend
    #[arg(long, env = "AGORA_STORE", value_enum, default_value_t = StoreKind::Memory)]
    pub store: StoreKind,

    /// SQLite database file (with --store sqlite)
    #[arg(long, env = "AGORA_DATABASE_PATH", default_value = "./chat.db")]
    pub database_path: PathBuf,

    /// Name of the timestamp column in the messages table
    #[arg(long, env = "AGORA_HISTORY_COLUMN", value_enum, default_value_t = HistoryColumn::CreatedAt)]
    pub history_column: HistoryColumn,

    /// Capacity of the broadcast queue
    #[arg(long, env = "AGORA_QUEUE_CAPACITY", default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Frames buffered per client; a client whose buffer fills is disconnected
    #[arg(long, env = "AGORA_CLIENT_BUFFER", default_value_t = 256)]
    pub client_buffer: usize,

    /// What happens when the broadcast queue is full
    #[arg(long, env = "AGORA_BACKPRESSURE", value_enum, default_value_t = BackpressurePolicy::Block)]
    pub backpressure: BackpressurePolicy,

    /// Close connections that send nothing for this many seconds (0 disables)
    #[arg(long, env = "AGORA_IDLE_TIMEOUT_SECS", default_value_t = 0)]
    pub idle_timeout_secs: u64,

    /// Replace `:smile:`-style shortcodes with emoji
    #[arg(long, env = "AGORA_EMOJI", default_value_t = true, action = ArgAction::Set)]
    pub emoji: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "AGORA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Print a signed token for SUBJECT and exit
    #[arg(long, value_name = "SUBJECT")]
    pub issue_token: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.client_buffer == 0 {
            return Err(ConfigError::ZeroClientBuffer);
        }
        if self.token_ttl_secs <= 0 {
            return Err(ConfigError::NonPositiveTokenTtl);
        }
        let needs_secret =
            self.auth_policy == AuthPolicyKind::VerifiedToken || self.issue_token.is_some();
        if needs_secret && self.jwt_secret.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingJwtSecret);
        }
        Ok(())
    }

    pub fn name_policy(&self) -> NamePolicy {
        // A token holder is the same person on every connection.
        if self.unique_names && self.auth_policy == AuthPolicyKind::TrustFirstFrame {
            NamePolicy::Unique
        } else {
            NamePolicy::AllowDuplicates
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}
