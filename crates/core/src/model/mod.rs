mod bank;
mod question;
mod session;

pub use bank::{BankError, QuestionBank};
pub use question::{
    DEFAULT_CATEGORY, DEFAULT_DIFFICULTY, DEFAULT_POINTS, EXPLANATION_PREVIEW_LIMIT,
    MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_OPTIONS, Question, QuestionDraft, QuestionError,
};
pub use session::{AnswerRecord, QuizMode, SessionState};
