pub mod config;
pub mod console_speech;
pub mod gemini_adapter;

use config::{Config, LlmProvider};
use gemini_client::GeminiClient;
use gemini_adapter::GeminiAdapter;
use secrecy::{ExposeSecret, SecretString};
use speakgenie_core::generator::{OpenAiGenerator, TextGenerator};
use std::sync::Arc;

/// Builds the text generator for the configured provider.
///
/// One instance is created at startup and shared by the session manager and
/// the translator.
pub fn build_generator(config: &Config) -> Arc<dyn TextGenerator> {
    tracing::info!(
        "Using {:?} provider with model '{}'",
        config.provider,
        config.chat_model
    );
    let api_key = SecretString::from(config.api_key.expose_secret().to_string());
    match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiAdapter::new(
            GeminiClient::new(api_key).with_model(&config.chat_model),
        )),
        LlmProvider::OpenAI => Arc::new(OpenAiGenerator::new(api_key, config.chat_model.clone())),
    }
}
