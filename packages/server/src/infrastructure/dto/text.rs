//! Plain text frames.
//!
//! Chat lines use `"<author>: <body> [<timestamp>]"` when timestamps are
//! enabled, else `"<author>: <body>"`.

use agora_shared::time::format_timestamp;

use crate::domain::{DisplayName, MessageBody, MessageRecord, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLineFormatter {
    show_timestamps: bool,
}

impl ChatLineFormatter {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }

    pub fn format(&self, author: &DisplayName, body: &MessageBody, at: Timestamp) -> String {
        if self.show_timestamps {
            format!("{}: {} [{}]", author, body.as_str(), format_timestamp(at.value()))
        } else {
            format!("{}: {}", author, body.as_str())
        }
    }

    pub fn format_record(&self, record: &MessageRecord) -> String {
        self.format(&record.author, &record.body, record.created_at)
    }
}

pub fn join_notice(name: &DisplayName) -> String {
    format!("🔵 {} joined", name)
}

pub fn leave_notice(name: &DisplayName) -> String {
    format!("🔴 {} left", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> DisplayName {
        DisplayName::new("alice".to_string()).unwrap()
    }

    #[test]
    fn test_format_with_timestamp() {
        // テスト項目: タイムスタンプ有効時は末尾に [時刻] が付く
        // given (前提条件):
        let formatter = ChatLineFormatter::new(true);
        let body = MessageBody::new("hi 😄".to_string()).unwrap();

        // when (操作):
        // 2023-01-01 00:00:00 UTC
        let line = formatter.format(&alice(), &body, Timestamp::new(1672531200000));

        // then (期待する結果):
        assert_eq!(line, "alice: hi 😄 [2023-01-01 00:00:00]");
    }

    #[test]
    fn test_format_without_timestamp() {
        // テスト項目: タイムスタンプ無効時は "author: body" のみ
        // given (前提条件):
        let formatter = ChatLineFormatter::new(false);
        let body = MessageBody::new("hi".to_string()).unwrap();

        // when (操作):
        let line = formatter.format(&alice(), &body, Timestamp::new(0));

        // then (期待する結果):
        assert_eq!(line, "alice: hi");
    }

    #[test]
    fn test_notices() {
        // テスト項目: 参加・退出通知の文言
        // then (期待する結果):
        assert_eq!(join_notice(&alice()), "🔵 alice joined");
        assert_eq!(leave_notice(&alice()), "🔴 alice left");
    }
}
