use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use super::{PersistResult, PersistenceStore};

#[derive(Debug, Default)]
struct Shared {
    entries: HashMap<String, String>,
    writes: usize,
    flushes: usize,
}

/// Process-local store, mostly for tests and ephemeral sessions.
///
/// Clones share entries and counters, so a clone kept by the caller observes
/// everything written through the one handed to a ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.lock().entries.insert(key.into(), value.into());
        store
    }

    /// Number of `set` calls since creation.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Number of `flush` calls since creation.
    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        Ok(self.lock().entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistResult<()> {
        let mut shared = self.lock();
        shared.entries.insert(key.to_string(), value.to_string());
        shared.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.lock().flushes += 1;
        Ok(())
    }
}
