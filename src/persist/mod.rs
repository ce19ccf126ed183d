//! Key-value persistence abstraction.

/// In-memory store.
pub mod memory;
/// SQLite-backed store.
pub mod sqlite;

/// Errors raised by a [`PersistenceStore`].
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Ledger (de)serialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// String key-value storage that survives restarts.
///
/// Values are written wholesale; there are no partial updates.
pub trait PersistenceStore: Send {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> PersistResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> PersistResult<()>;

    /// Makes prior writes durable. No-op by default.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
