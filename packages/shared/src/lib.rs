//! Utilities shared across the Agora packages.

pub mod logger;
pub mod time;
