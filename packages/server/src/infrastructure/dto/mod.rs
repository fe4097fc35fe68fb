//! Wire formats for frames sent to clients.
//!
//! - `websocket`: structured JSON frames (presence)
//! - `text`: plain text frames (chat lines, join/leave notices)

pub mod text;
pub mod websocket;
