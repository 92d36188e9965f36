use std::fmt;

use chrono::{DateTime, Utc};

use super::Question;

/// Which question source drives a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizMode {
    Classic,
    Ai,
}

impl QuizMode {
    /// Suffix appended to the result detail line.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            QuizMode::Classic => "",
            QuizMode::Ai => " · AI出题",
        }
    }

    #[must_use]
    pub fn from_arg(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizMode::Classic => f.write_str("classic"),
            QuizMode::Ai => f.write_str("ai"),
        }
    }
}

/// One answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    pub index: usize,
    pub selected_option: usize,
    pub was_correct: bool,
}

/// Mutable state of a single quiz run.
///
/// `current_index` stays within `0..=length`; the session is finished exactly
/// when it equals `length`. Score only grows and every index is answered at
/// most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    mode: QuizMode,
    length: usize,
    current_index: usize,
    score: u32,
    correct_count: u32,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
}

impl SessionState {
    #[must_use]
    pub fn new(mode: QuizMode, length: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            mode,
            length,
            current_index: 0,
            score: 0,
            correct_count: 0,
            answers: Vec::with_capacity(length),
            started_at,
        }
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_index == self.length
    }

    #[must_use]
    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.iter().any(|a| a.index == index)
    }

    /// True while on the last question of the session.
    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 >= self.length
    }

    /// Record an answer for the current question.
    ///
    /// Returns `None` (and changes nothing) when the session is finished or the
    /// current index already has an answer.
    pub fn record_answer(&mut self, question: &Question, selected: usize) -> Option<AnswerRecord> {
        if self.is_finished() || self.is_answered(self.current_index) {
            return None;
        }

        let was_correct = question.is_correct(selected);
        if was_correct {
            self.score = self.score.saturating_add(question.points());
            self.correct_count = self.correct_count.saturating_add(1);
        }

        let record = AnswerRecord {
            index: self.current_index,
            selected_option: selected,
            was_correct,
        };
        self.answers.push(record);
        Some(record)
    }

    /// Index that `advance` would move to, or `None` once finished.
    #[must_use]
    pub fn next_index(&self) -> Option<usize> {
        (!self.is_finished()).then_some(self.current_index + 1)
    }

    /// Move to the next index. Returns true when this reaches the end.
    pub fn advance(&mut self) -> bool {
        if self.current_index < self.length {
            self.current_index += 1;
        }
        self.is_finished()
    }
}
