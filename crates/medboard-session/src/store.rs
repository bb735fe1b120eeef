//! Session store
//!
//! Owns the authoritative in-memory snapshot, persists it through a
//! pluggable backend and publishes the current access token to dependents
//! (the proactive refresh timer) whenever it changes.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;

use medboard_storage::Database;

use crate::snapshot::SessionSnapshot;
use crate::Result;

/// Fixed key the snapshot is persisted under
const SESSION_KEY: &str = "session";

/// Persistence port for the session snapshot
pub trait SnapshotStore: Send + Sync {
    /// Missing or corrupt data reads as "no session", never as an error
    fn load(&self) -> Option<SessionSnapshot>;
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
    /// Remove the persisted snapshot entirely
    fn clear(&self) -> Result<()>;
}

/// SQLite-backed snapshot store
pub struct SqliteSnapshotStore {
    db: Database,
}

impl SqliteSnapshotStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load(&self) -> Option<SessionSnapshot> {
        let raw = match self.db.get_record(SESSION_KEY) {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session is corrupt, discarding");
                None
            }
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.db.set_record(SESSION_KEY, &json)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.delete_record(SESSION_KEY)?;
        Ok(())
    }
}

/// In-memory snapshot store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<SessionSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Option<SessionSnapshot> {
        self.slot.lock().clone()
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slot.lock().take();
        Ok(())
    }
}

pub struct SessionStore {
    /// Authoritative in-memory snapshot
    snapshot: Arc<RwLock<SessionSnapshot>>,
    /// Durable backend, written on every update
    backend: Arc<dyn SnapshotStore>,
    /// Access token change notifications
    token_tx: watch::Sender<Option<String>>,
}

impl SessionStore {
    /// Create a store, restoring any persisted snapshot
    pub fn new(backend: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = backend.load().unwrap_or_default();
        let (token_tx, _) = watch::channel(snapshot.access_token.clone());

        if snapshot.is_authenticated() {
            tracing::info!(
                user_email = ?snapshot.user_email,
                role = ?snapshot.role,
                "Restored persisted session"
            );
        }

        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            backend,
            token_tx,
        }
    }

    /// Read a copy of the current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    /// Atomic read-modify-write against the in-memory snapshot.
    ///
    /// Persists best-effort (the in-memory copy stays authoritative if the
    /// write fails) and publishes the new access token.
    pub fn update<F>(&self, f: F) -> SessionSnapshot
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        let snapshot = {
            let mut guard = self.snapshot.write();
            f(&mut guard);
            guard.clone()
        };

        if let Err(e) = self.backend.save(&snapshot) {
            tracing::warn!(error = %e, "Failed to persist session snapshot");
        }

        self.token_tx.send_replace(snapshot.access_token.clone());

        snapshot
    }

    /// Reset to the logged-out snapshot and delete the persisted record
    pub fn clear(&self) -> SessionSnapshot {
        let snapshot = {
            let mut guard = self.snapshot.write();
            *guard = SessionSnapshot::logged_out();
            guard.clone()
        };

        if let Err(e) = self.backend.clear() {
            tracing::warn!(error = %e, "Failed to delete persisted session");
        }

        self.token_tx.send_replace(None);

        snapshot
    }

    /// Subscribe to access token changes
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token_tx.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot.read().refresh_token.clone()
    }

    pub fn role(&self) -> Option<String> {
        self.snapshot.read().role.clone()
    }

    pub fn user_email(&self) -> Option<String> {
        self.snapshot.read().user_email.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.read().is_authenticated()
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            backend: Arc::clone(&self.backend),
            token_tx: self.token_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> SessionSnapshot {
        SessionSnapshot::logged_in(
            "T1".to_string(),
            "R1".to_string(),
            "admin".to_string(),
            "a@x.com".to_string(),
        )
    }

    #[test]
    fn test_save_load_roundtrip_memory() {
        let backend = Arc::new(MemoryStore::new());
        let store = SessionStore::new(backend.clone());
        store.update(|s| *s = logged_in());

        // A new store over the same backend sees the identical snapshot
        let restored = SessionStore::new(backend);
        assert_eq!(restored.snapshot(), logged_in());
    }

    #[test]
    fn test_save_load_roundtrip_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let backend = Arc::new(SqliteSnapshotStore::new(db.clone()));
        let store = SessionStore::new(backend);
        store.update(|s| *s = logged_in());

        let restored = SessionStore::new(Arc::new(SqliteSnapshotStore::new(db)));
        assert_eq!(restored.snapshot(), logged_in());
    }

    #[test]
    fn test_corrupt_persisted_snapshot_reads_as_logged_out() {
        let db = Database::open_in_memory().unwrap();
        db.set_record("session", "not json at all").unwrap();

        let store = SessionStore::new(Arc::new(SqliteSnapshotStore::new(db)));
        assert_eq!(store.snapshot(), SessionSnapshot::logged_out());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.update(|s| *s = logged_in());
        assert!(store.is_authenticated());

        assert_eq!(store.clear(), SessionSnapshot::logged_out());
        assert_eq!(store.clear(), SessionSnapshot::logged_out());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clear_deletes_persisted_record() {
        let db = Database::open_in_memory().unwrap();
        let store = SessionStore::new(Arc::new(SqliteSnapshotStore::new(db.clone())));
        store.update(|s| *s = logged_in());
        assert!(db.get_record("session").unwrap().is_some());

        store.clear();
        assert_eq!(db.get_record("session").unwrap(), None);

        let restored = SessionStore::new(Arc::new(SqliteSnapshotStore::new(db)));
        assert!(!restored.is_authenticated());
    }

    #[test]
    fn test_update_publishes_access_token() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), None);

        store.update(|s| *s = logged_in());
        assert_eq!(rx.borrow().as_deref(), Some("T1"));

        store.clear();
        assert_eq!(*rx.borrow(), None);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        struct FailingStore;
        impl SnapshotStore for FailingStore {
            fn load(&self) -> Option<SessionSnapshot> {
                None
            }
            fn save(&self, _snapshot: &SessionSnapshot) -> crate::Result<()> {
                Err(medboard_storage::StorageError::Migration("disk full".to_string()).into())
            }
            fn clear(&self) -> crate::Result<()> {
                Err(medboard_storage::StorageError::Migration("disk full".to_string()).into())
            }
        }

        let store = SessionStore::new(Arc::new(FailingStore));
        let snapshot = store.update(|s| *s = logged_in());
        assert_eq!(snapshot, logged_in());
        assert!(store.is_authenticated());
    }
}
