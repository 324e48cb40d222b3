use crate::types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    /// The endpoint answered with a non-success status.
    #[error("Gemini returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to reach Gemini: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini returned no text")]
    EmptyResponse,
}

/// A client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    generation_config: Option<GenerationConfig>,
}

impl GeminiClient {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            http: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation_config: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_generation_config(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.generation_config = Some(GenerationConfig {
            temperature,
            max_output_tokens,
        });
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends one prompt and returns the first candidate's text.
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GeminiError> {
        let mut request = GenerateContentRequest::from_prompt(prompt);
        request.generation_config = self.generation_config.clone();

        tracing::debug!("POST {}", self.endpoint());
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed = resp.json::<GenerateContentResponse>().await?;
        if let Some(reason) = parsed.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            tracing::debug!("Gemini finish reason: {}", reason);
        }
        parsed
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(GeminiError::EmptyResponse)
    }
}

/// Pulls the human-readable message out of a Gemini error body.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            if envelope.error.status.is_empty() {
                envelope.error.message
            } else {
                format!("{} ({})", envelope.error.message, envelope.error.status)
            }
        }
        _ => body.trim().to_string(),
    }
}
