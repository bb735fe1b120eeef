//! MedBoard Core
//!
//! Central coordination layer for the MedBoard console client: owns the
//! configuration and wires the session store, token lifecycle and REST
//! client together behind the `Console` facade. The view layer talks only
//! to this crate.

mod config;
mod console;
mod error;

pub use config::Config;
pub use console::Console;
pub use error::CoreError;

// Re-export core components
pub use medboard_api::{ApiClient, ApiError, AuthedClient, LoginResponse};
pub use medboard_auth::{AuthBackend, AuthError, RefreshCoordinator, RefreshScheduler};
pub use medboard_session::{
    MemoryStore, SessionError, SessionSnapshot, SessionStore, SnapshotStore, SqliteSnapshotStore,
};
pub use medboard_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
