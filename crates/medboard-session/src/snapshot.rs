//! Session snapshot data structure

use serde::{Deserialize, Serialize};

/// The persisted session record.
///
/// Either all fields are `None` (logged out) or both tokens are `Some`
/// (logged in); `role` and `user_email` travel with the tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Short-lived credential sent on every request
    pub access_token: Option<String>,
    /// Longer-lived credential exchanged for new access tokens
    pub refresh_token: Option<String>,
    /// Role reported by the backend at login
    pub role: Option<String>,
    /// Email used to log in, for display
    pub user_email: Option<String>,
}

impl SessionSnapshot {
    /// The logged-out snapshot
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Snapshot for a fresh login
    pub fn logged_in(
        access_token: String,
        refresh_token: String,
        role: String,
        user_email: String,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            role: Some(role),
            user_email: Some(user_email),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}
