mod http;
mod websocket;

pub use http::{active_users, health_check};
pub use websocket::websocket_handler;
