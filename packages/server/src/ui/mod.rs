//! Axum front end: router, handlers, and shutdown wiring.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
