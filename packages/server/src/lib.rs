//! Real-time text broadcast chat server.
//!
//! Connections authenticate with their first frame, then every text frame
//! they send is broadcast to all authenticated connections through a
//! single dispatcher, so every client observes the same order.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// wiring
pub mod app;
pub mod config;
