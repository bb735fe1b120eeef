//! MedBoard Storage Layer
//!
//! SQLite-based persistence for client state that must survive restarts.
//! Currently a single key/value table holding opaque JSON records.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
