//! MedBoard Session State
//!
//! - The session snapshot is the single source of truth for the current
//!   credentials, role and user identity
//! - It survives restarts via a pluggable persistence backend
//! - All mutation goes through `SessionStore::update`; other components
//!   only ever read clones

mod error;
mod snapshot;
mod store;

pub use error::SessionError;
pub use snapshot::SessionSnapshot;
pub use store::{MemoryStore, SessionStore, SnapshotStore, SqliteSnapshotStore};

pub type Result<T> = std::result::Result<T, SessionError>;
