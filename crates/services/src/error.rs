//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{BankError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while obtaining a question from a source.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SourceError {
    /// The generator could not be reached at all.
    #[error("question service unreachable: {0}")]
    Unavailable(String),
    /// The generator answered but reported a failure (`ok: false`).
    #[error("question service reported an error: {0}")]
    Rejected(String),
    #[error("question service returned an invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),
    #[error("question {index} is outside a session of {len}")]
    OutOfRange { index: usize, len: usize },
}

impl SourceError {
    /// Message shown to the player, with a hint on what to check.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Unavailable(_) => format!(
                "AI出题失败：{self}\n\n请检查：\n1. 出题服务是否启动\n2. 网络连接是否正常"
            ),
            SourceError::Rejected(_) | SourceError::InvalidQuestion(_) => format!(
                "AI出题失败：{self}\n\n请检查：\n1. API Key 是否配置\n2. 稍后重试"
            ),
            SourceError::OutOfRange { .. } => format!("AI出题失败：{self}"),
        }
    }
}

/// Errors emitted by the quiz controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz session is active")]
    NoSession,
    #[error("quiz session already finished")]
    Finished,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Bank(#[from] BankError),
}
