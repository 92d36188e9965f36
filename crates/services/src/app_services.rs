use std::path::Path;
use std::sync::Arc;

use quiz_core::model::QuestionBank;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::generator::QuestionGenerator;
use crate::quiz::{Presenter, QuizController};

/// Assembles the collaborators a quiz controller needs.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    bank: Arc<QuestionBank>,
    generator: Arc<dyn QuestionGenerator>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        bank: QuestionBank,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, clock, bank, generator))
    }

    /// Build services over in-memory storage; completions are not kept.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        bank: QuestionBank,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self::with_storage(Storage::in_memory(), clock, bank, generator)
    }

    #[must_use]
    pub fn with_storage(
        storage: Storage,
        clock: Clock,
        bank: QuestionBank,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self {
            clock,
            storage,
            bank: Arc::new(bank),
            generator,
        }
    }

    /// Load the classic bank from a JSON file, or use the built-in one.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Bank` if the file is unreadable or invalid.
    pub fn load_bank(path: Option<&Path>) -> Result<QuestionBank, AppServicesError> {
        let Some(path) = path else {
            return Ok(QuestionBank::builtin()?);
        };
        let raw = std::fs::read_to_string(path).map_err(|err| {
            quiz_core::model::BankError::Parse(format!("{}: {err}", path.display()))
        })?;
        let bank = QuestionBank::from_json(&raw)?;
        tracing::info!(path = %path.display(), questions = bank.len(), "loaded question bank");
        Ok(bank)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    /// A controller wired to these services and rendering through `presenter`.
    #[must_use]
    pub fn controller(&self, presenter: Arc<dyn Presenter>) -> QuizController {
        QuizController::new(
            Arc::clone(&self.bank),
            Arc::clone(&self.generator),
            Arc::clone(&self.storage.completions),
            presenter,
        )
        .with_clock(self.clock)
    }
}
