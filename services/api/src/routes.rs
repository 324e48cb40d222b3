use crate::AppState;
use crate::ws::handle_socket;
use axum::{
    Json,
    extract::{State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use speakgenie_core::profile::{StoreError, SyncOutcome, UserIdentity, sync_user};
use speakgenie_core::{SUPPORTED_LANGUAGES, Scenario, SupportedLanguage};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Store(StoreError::MissingRecord(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn list_scenarios() -> Json<&'static [Scenario]> {
    Json(Scenario::all())
}

pub async fn list_languages() -> Json<&'static [SupportedLanguage]> {
    Json(&SUPPORTED_LANGUAGES[..])
}

pub async fn sync_user_profile(
    State(state): State<AppState>,
    Json(identity): Json<UserIdentity>,
) -> Result<Json<SyncOutcome>, ApiError> {
    if identity.token_identifier.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "token_identifier must not be empty".to_string(),
        ));
    }
    let outcome = sync_user(state.users.as_ref(), &identity).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TranslateResponse {
    pub text: String,
}

pub async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Json<TranslateResponse> {
    let text = state
        .translator
        .translate_to_language(&req.text, &req.target)
        .await;
    Json(TranslateResponse { text })
}

/// Handles WebSocket upgrade requests.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    tracing::info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_state;

    fn identity(name: &str) -> UserIdentity {
        UserIdentity {
            token_identifier: "auth|42".to_string(),
            name: Some(name.to_string()),
            email: None,
        }
    }

    #[tokio::test]
    async fn catalogues_are_served() {
        assert_eq!(list_scenarios().await.0.len(), 3);

        let Json(languages) = list_languages().await;
        let codes: Vec<_> = languages.iter().map(|l| l.code).collect();
        assert_eq!(codes, ["en", "hi", "mr", "gu", "ta"]);
    }

    #[tokio::test]
    async fn sync_creates_then_updates() {
        let state = test_state();

        let Json(first) = sync_user_profile(State(state.clone()), Json(identity("Asha")))
            .await
            .unwrap();
        assert!(matches!(first, SyncOutcome::Created(_)));

        let Json(second) = sync_user_profile(State(state.clone()), Json(identity("Asha R")))
            .await
            .unwrap();
        assert!(matches!(second, SyncOutcome::Updated(ref u) if u.id == first.user().id));
    }

    #[tokio::test]
    async fn sync_rejects_blank_token() {
        let mut blank = identity("Asha");
        blank.token_identifier = " ".to_string();

        let err = sync_user_profile(State(test_state()), Json(blank))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn translate_passes_english_through() {
        let Json(resp) = translate(
            State(test_state()),
            Json(TranslateRequest {
                text: "Well done!".to_string(),
                target: "en".to_string(),
            }),
        )
        .await;

        assert_eq!(resp.text, "Well done!");
    }

    #[tokio::test]
    async fn translate_uses_the_model_for_other_languages() {
        let Json(resp) = translate(
            State(test_state()),
            Json(TranslateRequest {
                text: "Well done!".to_string(),
                target: "hi".to_string(),
            }),
        )
        .await;

        assert_eq!(resp.text, "canned translation");
    }
}
