//! The snapshot port (§4.3, §6): the only surface the core consumes from the
//! storage adapter. The on-disk binary format itself is explicitly out of
//! scope (§1) — the core only needs `save`/`load`/`list` against an opaque
//! byte blob.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::catalog::Database;
use crate::error::{EngineError, Result};

/// A snapshot persistence adapter. Implementations own the actual byte
/// format; the core only calls through this trait.
///
/// Per §5, the port permits concurrent readers but at most one writer — that
/// discipline is the adapter's responsibility (typically a file lock), not
/// something the core enforces.
pub trait SnapshotPort: Send + Sync {
    /// Persists a complete snapshot of `db`, keyed by its name.
    ///
    /// # Errors
    /// Returns an adapter-defined I/O failure description.
    fn save(&self, db: &Database) -> std::result::Result<(), String>;

    /// Restores a previously saved database by name.
    ///
    /// # Errors
    /// `Ok(None)` means "not found"; `Err` means a corrupt or unreadable
    /// snapshot.
    fn load(&self, name: &str) -> std::result::Result<Option<Database>, String>;

    /// Every database name with a saved snapshot.
    ///
    /// # Errors
    /// Returns an adapter-defined I/O failure description.
    fn list(&self) -> std::result::Result<Vec<String>, String>;
}

/// An in-memory [`SnapshotPort`] adapter used by tests to exercise the port
/// contract without touching disk. A real filesystem adapter is out of
/// scope for the core — this is deliberately the only implementation
/// shipped here.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<String, Database>>,
}

impl InMemorySnapshotStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotPort for InMemorySnapshotStore {
    fn save(&self, db: &Database) -> std::result::Result<(), String> {
        let mut guard = self.snapshots.lock().map_err(|_| "snapshot store poisoned".to_string())?;
        guard.insert(db.name.clone(), db.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> std::result::Result<Option<Database>, String> {
        let guard = self.snapshots.lock().map_err(|_| "snapshot store poisoned".to_string())?;
        Ok(guard.get(name).cloned())
    }

    fn list(&self) -> std::result::Result<Vec<String>, String> {
        let guard = self.snapshots.lock().map_err(|_| "snapshot store poisoned".to_string())?;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Wraps an adapter-defined save/load/list failure string as an
/// [`EngineError::Io`].
#[must_use]
pub fn io_error(detail: impl Into<String>) -> EngineError {
    EngineError::Io(detail.into())
}

/// Loads `name` through `port`, turning "not found" into a `NameError` and
/// any adapter failure into an `IOError`.
///
/// # Errors
/// See above.
pub fn load_database(port: &dyn SnapshotPort, name: &str) -> Result<Database> {
    let loaded = port.load(name).inspect_err(|e| warn!(database = name, error = %e, "snapshot load failed")).map_err(io_error)?;
    loaded.ok_or_else(|| {
        warn!(database = name, "snapshot load found no saved database");
        EngineError::unknown_database(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_database() {
        let store = InMemorySnapshotStore::new();
        let db = Database::new("d");
        store.save(&db).unwrap();
        assert_eq!(store.list().unwrap(), vec![String::from("d")]);
        let loaded = store.load("d").unwrap().unwrap();
        assert_eq!(loaded.name, "d");
    }

    #[test]
    fn load_missing_returns_none() {
        let store = InMemorySnapshotStore::new();
        assert!(store.load("missing").unwrap().is_none());
    }
}
