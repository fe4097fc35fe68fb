//! Message store implementations.
//!
//! - `inmemory`: process-local store (default)
//! - `sqlite`: durable store backed by a SQLite file

pub mod inmemory;
pub mod sqlite;

pub use inmemory::InMemoryMessageStore;
pub use sqlite::{HistoryColumn, SqliteMessageStore};
