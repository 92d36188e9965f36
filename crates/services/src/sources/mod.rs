//! Interchangeable providers of session questions.

mod ai;
mod classic;

use std::sync::Arc;

use async_trait::async_trait;

use quiz_core::model::Question;

use crate::error::SourceError;

pub use ai::{AI_SESSION_LENGTH, AiSource};
pub use classic::ClassicSource;

/// Ordered questions for one session, resolved by index.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Number of questions in the session.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `get(index)` would resolve without suspending.
    fn is_ready(&self, index: usize) -> bool;

    /// Resolve the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the question cannot be obtained.
    async fn get(&self, index: usize) -> Result<Arc<Question>, SourceError>;

    /// Start loading `index` in the background. Best effort.
    fn prefetch(&self, _index: usize) {}
}
