//! Main console state container
//!
//! Owns the authenticated session for the whole client process. Views read
//! through the accessors and issue requests through `api()`; they never
//! touch the snapshot directly.

use std::sync::Arc;

use medboard_api::{ApiClient, AuthedClient};
use medboard_auth::{RefreshCoordinator, RefreshScheduler};
use medboard_session::{SessionSnapshot, SessionStore, SnapshotStore, SqliteSnapshotStore};
use medboard_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct Console {
    /// Configuration
    config: Config,
    /// Authoritative session state
    store: SessionStore,
    /// Request pipeline for the view layer
    api: AuthedClient,
    /// Proactive renewal timer
    scheduler: RefreshScheduler,
}

impl Console {
    /// Initialize a new console instance with durable session storage.
    ///
    /// Restores any persisted session and arms the renewal timer off it.
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_snapshot_store(config, Arc::new(SqliteSnapshotStore::new(db)))
    }

    /// Initialize over an arbitrary snapshot backend
    pub fn with_snapshot_store(config: Config, backend: Arc<dyn SnapshotStore>) -> Result<Self> {
        let store = SessionStore::new(backend);

        let client = Arc::new(
            ApiClient::builder()
                .base_url(config.api_base_url.as_str())
                .store(store.clone())
                .timeout(config.request_timeout())
                .build()?,
        );

        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), client.clone()));
        let scheduler = RefreshScheduler::spawn(Arc::clone(&coordinator), store.subscribe());
        let api = AuthedClient::new(client, coordinator);

        Ok(Self {
            config,
            store,
            api,
            scheduler,
        })
    }

    /// Authenticate against the backend and replace the session wholesale
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let tokens = self.api.client().login(email, password).await?;

        self.store.update(|snapshot| {
            *snapshot = SessionSnapshot::logged_in(
                tokens.access_token.clone(),
                tokens.refresh_token.clone(),
                tokens.role.clone(),
                email.to_string(),
            );
        });

        tracing::info!(user_email = %email, role = %tokens.role, "Logged in");
        Ok(())
    }

    /// Drop the session. Always succeeds; safe to call repeatedly.
    pub fn logout(&self) {
        self.store.clear();
        tracing::info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn role(&self) -> Option<String> {
        self.store.role()
    }

    pub fn user_email(&self) -> Option<String> {
        self.store.user_email()
    }

    /// Request pipeline for the view layer
    pub fn api(&self) -> &AuthedClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stop the renewal timer (also happens on drop)
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
