//! Proactive renewal timer
//!
//! Arms a one-shot timer off the access token's expiry claim and invokes the
//! renewal coordinator shortly before expiry, so most requests never hit the
//! reactive 401 path. Correctness never depends on this: the request
//! pipeline's coordinated retry is the fallback.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::claims;
use crate::coordinator::RefreshCoordinator;

/// How long before expiry the renewal fires
pub const DEFAULT_RENEWAL_LEAD: Duration = Duration::from_secs(60);

pub struct RefreshScheduler {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Spawn the timer task, driven by access token changes.
    ///
    /// Whenever the token changes (login, rotation, logout) the armed timer
    /// is dropped and re-armed off the new token; a token with no decodable
    /// expiry arms nothing.
    pub fn spawn(
        coordinator: Arc<RefreshCoordinator>,
        token_rx: watch::Receiver<Option<String>>,
    ) -> Self {
        Self::spawn_with_lead(coordinator, token_rx, DEFAULT_RENEWAL_LEAD)
    }

    pub fn spawn_with_lead(
        coordinator: Arc<RefreshCoordinator>,
        token_rx: watch::Receiver<Option<String>>,
        lead: Duration,
    ) -> Self {
        let handle = tokio::spawn(run(coordinator, token_rx, lead));
        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop the timer task
    pub fn shutdown(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    coordinator: Arc<RefreshCoordinator>,
    mut token_rx: watch::Receiver<Option<String>>,
    lead: Duration,
) {
    loop {
        let expires_at = token_rx
            .borrow_and_update()
            .as_deref()
            .and_then(claims::expires_at);

        match expires_at {
            Some(expires_at) => {
                let delay = delay_until_renewal(expires_at, lead);
                tokio::select! {
                    changed = token_rx.changed() => {
                        // Token replaced; the armed timer is dropped here
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(delay) => {
                        tracing::debug!("Proactive renewal timer fired");
                        coordinator.refresh().await;
                        // The renewal (or the logout it forces) updates the
                        // store, which re-arms the loop
                        if token_rx.changed().await.is_err() {
                            break;
                        }
                    }
                }
            }
            None => {
                // No token, or no decodable expiry: nothing to arm
                if token_rx.changed().await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Time until `expires_at - lead`, clamped to zero when the token is already
/// inside the lead window or expired (renew immediately).
fn delay_until_renewal(expires_at: DateTime<Utc>, lead: Duration) -> Duration {
    let lead = chrono::Duration::from_std(lead).unwrap_or_default();
    (expires_at - lead - Utc::now())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthBackend, TokenPair};
    use async_trait::async_trait;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use medboard_session::{MemoryStore, SessionSnapshot, SessionStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn token_expiring_at(expires_at: DateTime<Utc>) -> String {
        let payload = format!(r#"{{"sub":"42","exp":{}}}"#, expires_at.timestamp());
        format!("header.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    struct FakeBackend {
        calls: AtomicUsize,
        next_access: String,
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn refresh(&self, _refresh_token: &str) -> crate::Result<TokenPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenPair {
                access_token: self.next_access.clone(),
                refresh_token: None,
            })
        }
    }

    fn setup(next_access: &str) -> (SessionStore, Arc<FakeBackend>, RefreshScheduler) {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let backend = Arc::new(FakeBackend {
            calls: AtomicUsize::new(0),
            next_access: next_access.to_string(),
        });
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), backend.clone()));
        let scheduler = RefreshScheduler::spawn(coordinator, store.subscribe());
        (store, backend, scheduler)
    }

    fn log_in_with(store: &SessionStore, access_token: String) {
        store.update(|s| {
            *s = SessionSnapshot::logged_in(
                access_token,
                "R1".to_string(),
                "admin".to_string(),
                "a@x.com".to_string(),
            )
        });
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_lead_before_expiry() {
        let renewed = token_expiring_at(Utc::now() + chrono::Duration::seconds(300));
        let (store, backend, _scheduler) = setup(&renewed);

        log_in_with(&store, token_expiring_at(Utc::now() + chrono::Duration::seconds(120)));
        settle().await;

        tokio::time::advance(Duration::from_secs(59)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // Renewal swapped only the access token
        assert_eq!(store.access_token().as_deref(), Some(renewed.as_str()));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_token_arms_nothing() {
        let (store, backend, _scheduler) = setup("unused");

        log_in_with(&store, "opaque-token".to_string());
        settle().await;

        tokio::time::advance(Duration::from_secs(86_400)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_change_cancels_armed_timer() {
        let (store, backend, _scheduler) = setup("unused-renewal");

        log_in_with(&store, token_expiring_at(Utc::now() + chrono::Duration::seconds(100)));
        settle().await;

        // Replace the token before the first timer fires
        log_in_with(&store, token_expiring_at(Utc::now() + chrono::Duration::seconds(1000)));
        settle().await;

        // Past the old deadline: the stale timer must not fire
        tokio::time::advance(Duration::from_secs(101)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        // The replacement's own deadline still fires
        tokio::time::advance(Duration::from_secs(839)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_renews_immediately() {
        let renewed = token_expiring_at(Utc::now() + chrono::Duration::seconds(600));
        let (store, backend, _scheduler) = setup(&renewed);

        log_in_with(&store, token_expiring_at(Utc::now() - chrono::Duration::seconds(10)));
        settle().await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_disarms_timer() {
        let (store, backend, _scheduler) = setup("unused");

        log_in_with(&store, token_expiring_at(Utc::now() + chrono::Duration::seconds(120)));
        settle().await;

        store.clear();
        settle().await;

        tokio::time::advance(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_delay_clamps_to_zero_inside_lead_window() {
        let expires_at = Utc::now() + chrono::Duration::seconds(30);
        assert_eq!(
            delay_until_renewal(expires_at, Duration::from_secs(60)),
            Duration::ZERO
        );
    }
}
