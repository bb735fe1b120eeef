//! MedBoard REST Client
//!
//! Transport layer for the console: a builder-configured reqwest wrapper
//! that speaks the backend's auth endpoints, plus the authenticated request
//! pipeline that attaches the bearer credential and replays a request once
//! after a coordinated token renewal.

mod authed;
mod client;
mod error;
mod types;

pub use authed::AuthedClient;
pub use client::{ApiClient, ApiClientBuilder};
pub use error::ApiError;
pub use types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};

pub type Result<T> = std::result::Result<T, ApiError>;
