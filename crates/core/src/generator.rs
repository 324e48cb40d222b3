use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Failure of a single text-generation call.
///
/// The variants follow the three situations the tutor distinguishes when it
/// picks an in-character fallback reply: the model endpoint does not exist,
/// the credentials were rejected, or anything else went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("model endpoint not found (404): {0}")]
    NotFound(String),
    #[error("model rejected the API key: {0}")]
    Unauthorized(String),
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned no text")]
    EmptyResponse,
}

impl GenerationError {
    /// Classifies a non-success HTTP response from a generation endpoint.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = body.trim().to_string();
        match status {
            404 => GenerationError::NotFound(detail),
            401 | 403 => GenerationError::Unauthorized(detail),
            400 if mentions_api_key(body) => GenerationError::Unauthorized(detail),
            _ => GenerationError::Request(format!("HTTP {status}: {detail}")),
        }
    }
}

fn mentions_api_key(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("api key") || lower.contains("api_key")
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(StatusCode::NOT_FOUND) => GenerationError::NotFound(err.to_string()),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                GenerationError::Unauthorized(err.to_string())
            }
            _ => GenerationError::Request(err.to_string()),
        }
    }
}

// The `TextGenerator` trait is the seam between the tutor logic and whichever
// hosted model answers it. Every piece of context is flattened into a single
// prompt string, so one request/response call is all a provider must offer.
//
// `#[cfg_attr(test, automock)]` generates `MockTextGenerator` for unit tests.
// It must sit above `#[async_trait]` so the mock sees the plain `async fn`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

/// `TextGenerator` backed by the OpenAI chat-completions endpoint.
pub struct OpenAiGenerator {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: OPENAI_CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.7
        });

        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::from_status(status.as_u16(), &text));
        }

        let parsed = resp.json::<ChatCompletionResponse>().await?;
        first_choice_text(parsed)
    }
}

fn first_choice_text(resp: ChatCompletionResponse) -> Result<String, GenerationError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}
