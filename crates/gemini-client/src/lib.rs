mod client;
pub mod types;

pub use client::{DEFAULT_MODEL, GeminiClient, GeminiError, error_message};
