#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod generator;
pub mod quiz;
pub mod sources;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuizError, SourceError};
pub use generator::{
    ChatQuestionGenerator, GenerateRequest, GenerateResponse, HttpQuestionGenerator,
    QuestionGenerator, generator_from_env,
};
pub use quiz::{
    Advance, AnswerFeedback, Presenter, QuizController, ResultSummary, Screen, SplashInfo,
};
pub use sources::{AI_SESSION_LENGTH, AiSource, ClassicSource, QuestionSource};
