use speakgenie_service::config::{Config, ConfigError};
use std::net::SocketAddr;

/// Holds all configuration loaded from the environment at startup.
pub struct ApiConfig {
    pub bind_address: SocketAddr,
    pub tutor: Config,
}

impl ApiConfig {
    /// Loads configuration from environment variables.
    ///
    /// On top of the tutor settings (`LLM_PROVIDER`, `GEMINI_API_KEY`,
    /// `OPENAI_API_KEY`, `CHAT_MODEL`, `RUST_LOG`) this reads:
    ///
    /// *   `BIND_ADDRESS`: The address and port to bind the server to. Defaults to "0.0.0.0:3000".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address = parse_bind_address(std::env::var("BIND_ADDRESS").ok())?;
        let tutor = Config::from_env()?;

        Ok(Self {
            bind_address,
            tutor,
        })
    }
}

fn parse_bind_address(value: Option<String>) -> Result<SocketAddr, ConfigError> {
    let value = value.unwrap_or_else(|| "0.0.0.0:3000".to_string());
    value
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))
}
