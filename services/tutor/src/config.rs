//! Application Configuration Module
//!
//! This module centralizes the configuration for the SpeakGenie service.
//! It loads settings from environment variables and provides a single,
//! shareable struct that can be passed throughout the application.

use secrecy::SecretString;
use std::env;
use tracing::Level;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    OpenAI,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL,
            LlmProvider::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }
}

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub provider: LlmProvider,
    /// Key for the selected provider.
    pub api_key: SecretString,
    pub chat_model: String,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    // *   `LLM_PROVIDER`: "gemini" (default) or "openai".
    // *   `GEMINI_API_KEY`: Your secret key for the Gemini API. Required if provider is "gemini".
    // *   `OPENAI_API_KEY`: Your secret key for the OpenAI API. Required if provider is "openai".
    // *   `CHAT_MODEL`: (Optional) The model answering the learner. Defaults per provider.
    // *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider_str = lookup("LLM_PROVIDER").unwrap_or_else(|| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => LlmProvider::Gemini,
            "openai" => LlmProvider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of gemini, openai", other),
                ));
            }
        };

        let key_var = match provider {
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
        };
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| {
                ConfigError::MissingVar(format!(
                    "{} must be set for {} provider",
                    key_var, provider_str
                ))
            })?;

        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            provider,
            api_key,
            chat_model,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_gemini_flash() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();

        assert_eq!(config.provider, LlmProvider::Gemini);
        assert_eq!(config.chat_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.api_key.expose_secret(), "g-key");
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn openai_provider_uses_its_own_key_and_model() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_PROVIDER", "OpenAI"),
            ("OPENAI_API_KEY", "o-key"),
            ("GEMINI_API_KEY", "g-key"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.api_key.expose_secret(), "o-key");
        assert_eq!(config.chat_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "o-key")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(msg) if msg.starts_with("GEMINI_API_KEY")));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn rejects_unknown_provider_and_bad_log_level() {
        let err = Config::from_lookup(lookup(&[("LLM_PROVIDER", "llama")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "LLM_PROVIDER"));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("RUST_LOG", "LOUD")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "RUST_LOG"));
    }

    #[test]
    fn chat_model_can_be_overridden() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("CHAT_MODEL", "gemini-1.5-pro"),
        ]))
        .unwrap();
        assert_eq!(config.chat_model, "gemini-1.5-pro");
    }
}
