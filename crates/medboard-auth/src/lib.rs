//! MedBoard Token Lifecycle
//!
//! Keeps the access credential fresh across the life of the client:
//! - A renewal coordinator that collapses concurrent renewal requests into
//!   a single backend call and applies rotation rules to the result
//! - A proactive timer that renews shortly before the token expires
//! - Best-effort, non-verifying expiry decoding for scheduling only

mod backend;
mod claims;
mod coordinator;
mod error;
mod scheduler;

pub use backend::{AuthBackend, TokenPair};
pub use claims::expires_at;
pub use coordinator::RefreshCoordinator;
pub use error::AuthError;
pub use scheduler::{RefreshScheduler, DEFAULT_RENEWAL_LEAD};

pub type Result<T> = std::result::Result<T, AuthError>;
