//! Renewal backend port

use async_trait::async_trait;

use crate::Result;

/// Token pair returned by a successful renewal.
///
/// The refresh token is optional: the backend rotates it opportunistically,
/// and when it is absent the caller keeps the one it already holds.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// The network side of token renewal, kept behind a port so the lifecycle
/// machinery is testable without a real backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange the refresh token for a new token pair
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair>;
}
