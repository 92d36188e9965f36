#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{COMPLETIONS_KEY, CompletionCounter, InMemoryRepository, Storage, StorageError};
