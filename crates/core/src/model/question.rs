use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_OPTIONS: usize = 2;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// Explanations longer than this many characters are shortened for feedback.
pub const EXPLANATION_PREVIEW_LIMIT: usize = 60;
const EXPLANATION_PREVIEW_KEEP: usize = 58;

pub const DEFAULT_POINTS: u32 = 10;
pub const DEFAULT_DIFFICULTY: u8 = 3;
pub const DEFAULT_CATEGORY: &str = "AI出题";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("question needs at least {MIN_OPTIONS} options, got {len}")]
    TooFewOptions { len: usize },

    #[error("answer index {index} is out of range for {len} options")]
    AnswerOutOfRange { index: usize, len: usize },

    #[error("difficulty {0} is outside 1-5")]
    InvalidDifficulty(u8),
}

/// Unvalidated question as it arrives from a bank file or a generator.
///
/// Field names follow the generator's JSON payload (`answer` is the index of
/// the correct option).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub answer: usize,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub scene: Option<serde_json::Value>,
}

fn default_points() -> u32 {
    DEFAULT_POINTS
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_difficulty() -> u8 {
    DEFAULT_DIFFICULTY
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than two
    /// options, the answer index is out of range, or difficulty is not 1-5.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                len: self.options.len(),
            });
        }
        if self.answer >= self.options.len() {
            return Err(QuestionError::AnswerOutOfRange {
                index: self.answer,
                len: self.options.len(),
            });
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(QuestionError::InvalidDifficulty(self.difficulty));
        }

        // `null` scenes are plain rule questions.
        let scene = self.scene.filter(|scene| !scene.is_null());

        Ok(Question {
            text,
            options: self.options,
            answer_index: self.answer,
            points: self.points,
            category: self.category.trim().to_string(),
            difficulty: self.difficulty,
            explanation: self.explanation,
            scene,
        })
    }
}

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    text: String,
    options: Vec<String>,
    answer_index: usize,
    points: u32,
    category: String,
    difficulty: u8,
    explanation: String,
    scene: Option<serde_json::Value>,
}

impl Question {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Opaque table-scene payload for the presentation layer.
    #[must_use]
    pub fn scene(&self) -> Option<&serde_json::Value> {
        self.scene.as_ref()
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.answer_index
    }

    /// Explanation shortened for the feedback panel.
    ///
    /// Anything over `EXPLANATION_PREVIEW_LIMIT` characters keeps the first 58
    /// characters followed by `…`.
    #[must_use]
    pub fn explanation_preview(&self) -> String {
        if self.explanation.chars().count() > EXPLANATION_PREVIEW_LIMIT {
            let mut short: String = self
                .explanation
                .chars()
                .take(EXPLANATION_PREVIEW_KEEP)
                .collect();
            short.push('…');
            short
        } else {
            self.explanation.clone()
        }
    }
}
