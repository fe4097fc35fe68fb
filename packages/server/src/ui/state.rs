//! Server state shared by every handler.

use std::sync::Arc;

use crate::usecase::{PresencePublisher, SessionLoop};

/// Shared application state
pub struct AppState {
    /// SessionLoop（コネクションごとの状態機械）
    pub session_loop: Arc<SessionLoop>,
    /// PresencePublisher（オンライン一覧の参照）
    pub presence: Arc<PresencePublisher>,
    /// コネクションごとの送信バッファ容量
    pub client_buffer: usize,
}
