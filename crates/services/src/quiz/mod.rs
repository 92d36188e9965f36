mod controller;
mod presenter;

pub use controller::{Advance, QuizController, SPLASH_BASE_PLAYERS, SPLASH_DAILY_SPREAD};
pub use presenter::{AnswerFeedback, Presenter, ResultSummary, Screen, SplashInfo};
