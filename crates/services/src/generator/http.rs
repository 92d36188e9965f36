use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use quiz_core::model::Question;

use super::{GenerateRequest, GenerateResponse, QuestionGenerator};
use crate::error::SourceError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/ai-question";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the JSON question-generation endpoint.
#[derive(Clone)]
pub struct HttpQuestionGenerator {
    client: Client,
    endpoint: String,
}

impl HttpQuestionGenerator {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint from `QUIZ_GENERATOR_URL`, falling back to `DEFAULT_ENDPOINT`.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = env::var("QUIZ_GENERATOR_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into());
        Self::new(endpoint)
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<Question, SourceError> {
        tracing::debug!(
            index = request.question_index,
            used = request.used_categories.len(),
            "requesting generated question"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;

        // Failures still come back as a JSON envelope, usually with a 500.
        match serde_json::from_str::<GenerateResponse>(&body) {
            Ok(envelope) => envelope.into_question(),
            Err(_) if !status.is_success() => Err(SourceError::Rejected(format!("HTTP {status}"))),
            Err(err) => Err(SourceError::Rejected(format!("unreadable response: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let generator = HttpQuestionGenerator::new("http://127.0.0.1:9/api/ai-question");
        let request = GenerateRequest {
            question_index: 0,
            used_categories: Vec::new(),
        };
        let err = generator.generate(&request).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)), "{err:?}");
    }
}
