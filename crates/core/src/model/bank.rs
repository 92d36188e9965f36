use std::sync::Arc;

use thiserror::Error;

use super::question::{Question, QuestionDraft, QuestionError};

const BUILTIN_BANK: &str = include_str!("../../data/classic_bank.json");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("question bank is not valid JSON: {0}")]
    Parse(String),

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Fixed, fully pre-loaded question list for classic sessions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Arc<Question>>,
}

impl QuestionBank {
    /// Build a bank from validated questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Empty` when no questions are given.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        Ok(Self {
            questions: questions.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a JSON array of question drafts.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the JSON is malformed, any question fails
    /// validation, or the array is empty.
    pub fn from_json(raw: &str) -> Result<Self, BankError> {
        let drafts: Vec<QuestionDraft> =
            serde_json::from_str(raw).map_err(|err| BankError::Parse(err.to_string()))?;
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate()
                    .map_err(|source| BankError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    /// The bank compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `BankError` only if the embedded data is corrupt.
    pub fn builtin() -> Result<Self, BankError> {
        Self::from_json(BUILTIN_BANK)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Question>> {
        self.questions.get(index)
    }

    /// Sum of all question points; the best score a classic session can reach.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.points()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_loads_and_tops_out_at_100() {
        let bank = QuestionBank::builtin().unwrap();
        assert_eq!(bank.len(), 10);
        assert_eq!(bank.max_score(), 100);
        assert!(bank.get(10).is_none());
    }

    #[test]
    fn empty_array_is_rejected() {
        assert_eq!(QuestionBank::from_json("[]").unwrap_err(), BankError::Empty);
    }

    #[test]
    fn reports_index_of_invalid_question() {
        let raw = r#"[
            {"text": "ok", "options": ["a", "b"], "answer": 0},
            {"text": "bad", "options": ["a", "b"], "answer": 5}
        ]"#;
        let err = QuestionBank::from_json(raw).unwrap_err();
        assert!(matches!(err, BankError::InvalidQuestion { index: 1, .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            QuestionBank::from_json("{not json"),
            Err(BankError::Parse(_))
        ));
    }
}
