use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Counter bumped once per finished quiz session.
pub const COMPLETIONS_KEY: &str = "quizCompletions";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable named integer counters shared across sessions.
///
/// A missing counter reads as 0.
#[async_trait]
pub trait CompletionCounter: Send + Sync {
    /// Current value of the counter.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn read(&self, key: &str) -> Result<u64, StorageError>;

    /// Add one to the counter and return the new value.
    ///
    /// The read and the write happen as one step, so concurrent increments
    /// never lose updates.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be updated.
    async fn increment(&self, key: &str) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CompletionCounter for InMemoryRepository {
    async fn read(&self, key: &str) -> Result<u64, StorageError> {
        let guard = self
            .counters
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).copied().unwrap_or(0))
    }

    async fn increment(&self, key: &str) -> Result<u64, StorageError> {
        let mut guard = self
            .counters
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let value = guard.entry(key.to_string()).or_insert(0);
        *value = value.saturating_add(1);
        Ok(*value)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub completions: Arc<dyn CompletionCounter>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let completions: Arc<dyn CompletionCounter> = Arc::new(repo);
        Self { completions }
    }
}
