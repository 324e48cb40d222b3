//! Tutor sessions over WebSocket.
//!
//! Each connection owns one `TutorSession`. Speech capture and playback stay
//! in the browser; the socket carries text only. The session is dropped with
//! the connection, so nothing of the conversation outlives it.

use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use serde::{Deserialize, Serialize};
use speakgenie_core::language::BASE_LANGUAGE;
use speakgenie_core::{ChatMessage, Translator, TutorSession};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    StartFreeFlow,
    StartScenario { id: String },
    SendMessage { text: String },
    SetLanguage { code: String },
    History,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Reply {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        translated: Option<String>,
    },
    History {
        messages: Vec<ChatMessage>,
    },
    LanguageSet {
        code: String,
    },
    Cleared,
    Error {
        message: String,
    },
}

pub struct SocketSession {
    session: TutorSession,
    translator: Arc<Translator>,
    language: String,
}

impl SocketSession {
    pub fn new(state: &AppState) -> Self {
        Self {
            session: TutorSession::new(state.generator.clone()),
            translator: state.translator.clone(),
            language: BASE_LANGUAGE.to_string(),
        }
    }

    pub async fn handle(&mut self, msg: ClientMessage) -> ServerMessage {
        match msg {
            ClientMessage::StartFreeFlow => {
                let welcome = self.session.start_free_flow();
                self.reply(welcome).await
            }
            ClientMessage::StartScenario { id } => match self.session.start_scenario(&id) {
                Ok(welcome) => self.reply(welcome).await,
                Err(e) => ServerMessage::Error {
                    message: e.to_string(),
                },
            },
            ClientMessage::SendMessage { text } => {
                let text = text.trim();
                if text.is_empty() {
                    return ServerMessage::Error {
                        message: "Message text is empty".to_string(),
                    };
                }
                let reply = self.session.send_message(text).await;
                self.reply(reply).await
            }
            ClientMessage::SetLanguage { code } => {
                self.language = code.clone();
                ServerMessage::LanguageSet { code }
            }
            ClientMessage::History => ServerMessage::History {
                messages: self.session.history(),
            },
            ClientMessage::Clear => {
                self.session.clear();
                ServerMessage::Cleared
            }
        }
    }

    async fn reply(&mut self, text: String) -> ServerMessage {
        let translated = if self.language == BASE_LANGUAGE {
            None
        } else {
            let translated = self
                .translator
                .translate_to_language(&text, &self.language)
                .await;
            self.session.annotate_last_reply(translated.clone());
            Some(translated)
        };
        ServerMessage::Reply { text, translated }
    }
}

fn decode(text: &str) -> Result<ClientMessage, ServerMessage> {
    serde_json::from_str(text).map_err(|e| ServerMessage::Error {
        message: format!("Invalid message: {e}"),
    })
}

/// Manages an individual WebSocket connection.
pub async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::info!("WebSocket connection established");
    let mut session = SocketSession::new(&state);

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::info!("WebSocket error: {}", e);
                break;
            }
        };

        let response = match msg {
            Message::Text(text) => match decode(text.as_str()) {
                Ok(command) => session.handle(command).await,
                Err(err) => err,
            },
            Message::Close(_) => break,
            // Ping/Pong are answered by axum; binary frames are not part of the protocol.
            _ => continue,
        };

        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(payload.into())).await.is_err() {
            // Client disconnected; a finished reply is simply discarded.
            break;
        }
    }

    tracing::info!("WebSocket connection closed");
}
