mod config;
mod routes;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use config::ApiConfig;
use speakgenie_core::generator::TextGenerator;
use speakgenie_core::profile::{InMemoryUserStore, UserStore};
use speakgenie_core::Translator;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Shared by every request. One generator serves both sessions and translation.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub translator: Arc<Translator>,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>, users: Arc<dyn UserStore>) -> Self {
        Self {
            translator: Arc::new(Translator::new(generator.clone())),
            generator,
            users,
        }
    }
}

fn app(state: AppState) -> Router {
    // Permissive CORS so a separately hosted frontend can reach the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/scenarios", get(routes::list_scenarios))
        .route("/languages", get(routes::list_languages))
        .route("/users/sync", post(routes::sync_user_profile))
        .route("/translate", post(routes::translate))
        .route("/ws", get(routes::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.tutor.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    let generator = speakgenie_service::build_generator(&config.tutor);
    let state = AppState::new(generator, Arc::new(InMemoryUserStore::new()));

    info!("Starting SpeakGenie API, listening on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use speakgenie_core::GenerationError;

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            if prompt.starts_with("Translate") {
                Ok("canned translation".to_string())
            } else {
                Ok("canned reply".to_string())
            }
        }
    }

    pub(crate) fn test_state() -> AppState {
        AppState::new(Arc::new(CannedGenerator), Arc::new(InMemoryUserStore::new()))
    }

    #[test]
    fn router_builds_with_all_routes() {
        let _router = app(test_state());
    }
}
