//! JSON frames sent over the WebSocket.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ActiveUsers,
}

/// Presence frame: `{"type":"active_users","users":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUsersMessage {
    pub r#type: MessageType,
    pub users: Vec<String>,
}

impl ActiveUsersMessage {
    pub fn new(users: Vec<String>) -> Self {
        Self {
            r#type: MessageType::ActiveUsers,
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_users_wire_shape() {
        // テスト項目: プレゼンスフレームが規定の JSON 形に直列化される
        // given (前提条件):
        let message = ActiveUsersMessage::new(vec!["alice".to_string(), "bob".to_string()]);

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"type":"active_users","users":["alice","bob"]}"#);
    }

    #[test]
    fn test_active_users_parses_back() {
        // テスト項目: クライアント側で受け取った JSON を解釈できる
        // given (前提条件):
        let json = r#"{"type":"active_users","users":[]}"#;

        // when (操作):
        let message: ActiveUsersMessage = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(message, ActiveUsersMessage::new(vec![]));
    }
}
