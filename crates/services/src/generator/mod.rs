//! Remote question generation.
//!
//! A generator turns a `GenerateRequest` (which question of the session, and
//! which categories were already used) into one validated `Question`.

mod chat;
mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quiz_core::model::{Question, QuestionDraft};

use crate::error::SourceError;

pub use chat::{ChatGeneratorConfig, ChatQuestionGenerator, QuestionPlan, CATEGORIES};
pub use http::{DEFAULT_ENDPOINT, HttpQuestionGenerator};

/// Body of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub question_index: usize,
    #[serde(default)]
    pub used_categories: Vec<String>,
}

/// Envelope returned by the generation endpoint.
///
/// `error` is only meaningful when `ok` is false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub ok: bool,
    #[serde(default)]
    pub question: Option<QuestionDraft>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// Unwrap the envelope into a validated question.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Rejected` when the service flagged a failure or
    /// sent no question, and `SourceError::InvalidQuestion` when the question
    /// fails validation.
    pub fn into_question(self) -> Result<Question, SourceError> {
        if !self.ok {
            let message = self
                .error
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| "接口返回错误".to_string());
            return Err(SourceError::Rejected(message));
        }
        let draft = self
            .question
            .ok_or_else(|| SourceError::Rejected("response carried no question".into()))?;
        Ok(draft.validate()?)
    }
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce the question for `request.question_index`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` when the service cannot be reached
    /// and `SourceError::Rejected` when it answers with a failure.
    async fn generate(&self, request: &GenerateRequest) -> Result<Question, SourceError>;
}

/// Pick a generator from the environment.
///
/// A configured chat API key talks to the model directly; otherwise questions
/// come from the HTTP endpoint (`endpoint`, then `QUIZ_GENERATOR_URL`, then
/// `DEFAULT_ENDPOINT`).
#[must_use]
pub fn generator_from_env(endpoint: Option<String>) -> Arc<dyn QuestionGenerator> {
    if endpoint.is_none() {
        if let Some(config) = ChatGeneratorConfig::from_env() {
            tracing::info!(model = %config.model, "using chat question generator");
            return Arc::new(ChatQuestionGenerator::new(Some(config)));
        }
    }
    let generator = endpoint.map_or_else(HttpQuestionGenerator::from_env, HttpQuestionGenerator::new);
    tracing::info!(endpoint = generator.endpoint(), "using http question generator");
    Arc::new(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_snake_case_fields() {
        let request = GenerateRequest {
            question_index: 2,
            used_categories: vec!["基础规则".into()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "question_index": 2, "used_categories": ["基础规则"] })
        );
    }

    #[test]
    fn rejected_response_keeps_service_message() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"ok": false, "error": "rate limited"}"#).unwrap();
        assert_eq!(
            response.into_question(),
            Err(SourceError::Rejected("rate limited".into()))
        );
    }

    #[test]
    fn rejected_response_without_message_gets_fallback() {
        let response: GenerateResponse = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        assert!(matches!(response.into_question(), Err(SourceError::Rejected(_))));
    }

    #[test]
    fn ok_response_without_question_is_rejected() {
        let response: GenerateResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(matches!(response.into_question(), Err(SourceError::Rejected(_))));
    }

    #[test]
    fn ok_response_yields_validated_question() {
        let raw = r#"{
            "ok": true,
            "question": {
                "category": "炸弹使用",
                "difficulty": 2,
                "points": 8,
                "text": "哪个最大？",
                "options": ["A. 四张炸弹", "B. 同花顺", "C. 六张炸弹", "D. 三带二"],
                "answer": 2,
                "explanation": "六张炸弹大于同花顺。",
                "scene": null
            }
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let question = response.into_question().unwrap();
        assert_eq!(question.points(), 8);
        assert_eq!(question.category(), "炸弹使用");
    }

    #[test]
    fn ok_response_with_bad_answer_is_invalid() {
        let raw = r#"{"ok": true, "question": {"text": "?", "options": ["a", "b"], "answer": 4}}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            response.into_question(),
            Err(SourceError::InvalidQuestion(_))
        ));
    }
}
