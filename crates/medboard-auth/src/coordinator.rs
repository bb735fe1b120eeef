//! Renewal coordinator
//!
//! Performs the renewal call against the backend, collapsing concurrent
//! callers into a single in-flight operation: the first caller starts the
//! renewal and stores a shared handle, later callers await the same handle,
//! and the handle is cleared when the operation settles.

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use std::sync::Arc;
use tokio::sync::Mutex;

use medboard_session::SessionStore;

use crate::backend::AuthBackend;

type InFlight = Shared<BoxFuture<'static, Option<String>>>;

pub struct RefreshCoordinator {
    store: SessionStore,
    backend: Arc<dyn AuthBackend>,
    /// At most one renewal per expiry cycle
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl RefreshCoordinator {
    pub fn new(store: SessionStore, backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            store,
            backend,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Renew the access token.
    ///
    /// Returns the new access token, or `None` when there is no refresh
    /// token or the renewal failed. A failed renewal drops the whole
    /// session; it is not retried here.
    pub async fn refresh(&self) -> Option<String> {
        let refresh_token = self.store.refresh_token()?;

        let operation = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.as_ref() {
                Some(operation) => operation.clone(),
                None => {
                    let store = self.store.clone();
                    let backend = Arc::clone(&self.backend);
                    let slot = Arc::clone(&self.in_flight);

                    let operation = async move {
                        let result = renew(store, backend, refresh_token).await;
                        // Release the slot whatever the outcome, so a later
                        // cycle can renew again
                        slot.lock().await.take();
                        result
                    }
                    .boxed()
                    .shared();

                    *in_flight = Some(operation.clone());
                    operation
                }
            }
        };

        operation.await
    }
}

async fn renew(
    store: SessionStore,
    backend: Arc<dyn AuthBackend>,
    refresh_token: String,
) -> Option<String> {
    match backend.refresh(&refresh_token).await {
        Ok(tokens) => {
            store.update(|snapshot| {
                snapshot.access_token = Some(tokens.access_token.clone());
                // Rotation is opportunistic: keep the current refresh token
                // unless the backend sent a replacement
                if let Some(rotated) = &tokens.refresh_token {
                    snapshot.refresh_token = Some(rotated.clone());
                }
            });

            tracing::debug!("Access token renewed");
            Some(tokens.access_token)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Token renewal failed, dropping session");
            store.clear();
            None
        }
    }
}

impl Clone for RefreshCoordinator {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            backend: Arc::clone(&self.backend),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}
