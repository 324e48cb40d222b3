use async_trait::async_trait;
use gemini_client::{GeminiClient, GeminiError};
use speakgenie_core::generator::{GenerationError, TextGenerator};

/// An adapter that implements the generic `TextGenerator` trait for the `gemini_client::GeminiClient`.
pub struct GeminiAdapter {
    client: GeminiClient,
}

impl GeminiAdapter {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

/// Maps Gemini failures onto the categories the tutor's fallback replies use.
pub fn classify(err: GeminiError) -> GenerationError {
    match err {
        GeminiError::Status { status, message } => GenerationError::from_status(status, &message),
        GeminiError::Transport(e) => GenerationError::from(e),
        GeminiError::EmptyResponse => GenerationError::EmptyResponse,
    }
}

#[async_trait]
impl TextGenerator for GeminiAdapter {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.client.generate_content(prompt).await.map_err(|e| {
            tracing::debug!("Gemini call on model '{}' failed: {}", self.client.model(), e);
            classify(e)
        })
    }
}
