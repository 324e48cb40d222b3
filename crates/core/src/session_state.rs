use crate::generator::{GenerationError, TextGenerator};
use crate::message::{ChatMessage, Role};
use crate::scenario::Scenario;
use std::collections::VecDeque;
use std::sync::Arc;

/// Maximum number of transcript entries kept; older ones are evicted first.
pub const HISTORY_LIMIT: usize = 20;
/// Number of trailing transcript entries rendered into each prompt.
pub const PROMPT_WINDOW: usize = 6;

pub const FREE_FLOW_WELCOME: &str = "Hello! I'm your English tutor. You can talk to me about anything you'd like to practice. Just start speaking and I'll help you improve your English! What would you like to talk about today?";

const FREE_FLOW_INSTRUCTION: &str = "You are a friendly English tutor. Help the student practice English conversation. Keep responses encouraging, simple, and conversational. Gently correct mistakes and ask follow-up questions to keep the conversation flowing.";

const CLOSING_INSTRUCTION: &str = "Please respond as the tutor. Keep your response under 100 words and focus on helping the student practice English naturally.";

pub const FALLBACK_NOT_FOUND: &str = "I'm having trouble connecting to my AI brain right now. Let me try a different approach. Could you repeat what you said?";
pub const FALLBACK_CONFIGURATION: &str = "There seems to be an issue with my configuration. Please check that the API key is set up correctly.";
pub const FALLBACK_GENERIC: &str = "I'm sorry, I'm having trouble understanding right now. Could you try saying that again?";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),
}

/// Picks the in-character line that replaces a failed model call.
pub fn fallback_reply(err: &GenerationError) -> &'static str {
    match err {
        GenerationError::NotFound(_) => FALLBACK_NOT_FOUND,
        GenerationError::Unauthorized(_) => FALLBACK_CONFIGURATION,
        GenerationError::Request(_) | GenerationError::EmptyResponse => FALLBACK_GENERIC,
    }
}

/// Renders the model prompt for the next tutor turn.
///
/// The prompt is the scenario instruction and context line (or the generic
/// tutor instruction in free-flow mode), the last [`PROMPT_WINDOW`] transcript
/// entries as `Student:`/`Tutor:` lines, and a closing instruction.
pub fn build_prompt<'a, I>(scenario: Option<&Scenario>, history: I) -> String
where
    I: IntoIterator<Item = &'a ChatMessage>,
    I::IntoIter: ExactSizeIterator,
{
    let mut prompt = match scenario {
        Some(s) => format!("{}\n\nContext: {}\n\n", s.system_prompt, s.context),
        None => format!("{FREE_FLOW_INSTRUCTION}\n\n"),
    };

    let history = history.into_iter();
    let skip = history.len().saturating_sub(PROMPT_WINDOW);
    prompt.push_str("Recent conversation:\n");
    for msg in history.skip(skip) {
        prompt.push_str(msg.role.prompt_label());
        prompt.push_str(": ");
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

/// Owns the transcript and active scenario of one conversation.
///
/// A session lives from `start_free_flow`/`start_scenario` until `clear` or
/// until it is dropped; nothing is persisted.
pub struct TutorSession {
    generator: Arc<dyn TextGenerator>,
    history: VecDeque<ChatMessage>,
    scenario: Option<&'static Scenario>,
}

impl TutorSession {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            history: VecDeque::with_capacity(HISTORY_LIMIT + 1),
            scenario: None,
        }
    }

    pub fn start_free_flow(&mut self) -> String {
        self.scenario = None;
        self.history.clear();
        self.push(ChatMessage::assistant(FREE_FLOW_WELCOME));
        tracing::info!("Started free-flow conversation");
        FREE_FLOW_WELCOME.to_string()
    }

    pub fn start_scenario(&mut self, id: &str) -> Result<String, SessionError> {
        // Look up first so an unknown id leaves the current session untouched.
        let scenario =
            Scenario::find(id).ok_or_else(|| SessionError::ScenarioNotFound(id.to_string()))?;

        self.scenario = Some(scenario);
        self.history.clear();
        let welcome = scenario.welcome_message();
        self.push(ChatMessage::assistant(welcome.clone()));
        tracing::info!("Started roleplay scenario '{}'", scenario.id);
        Ok(welcome)
    }

    /// Records the learner's utterance and returns the tutor's reply.
    ///
    /// Model failures never reach the caller: they are logged and replaced
    /// by one of the fixed fallback lines, which is recorded like a reply.
    pub async fn send_message(&mut self, user_text: &str) -> String {
        self.push(ChatMessage::user(user_text));

        let prompt = build_prompt(self.scenario, &self.history);
        tracing::debug!("Sending prompt of {} chars to model", prompt.len());

        let reply = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Model call failed: {}", e);
                fallback_reply(&e).to_string()
            }
        };

        self.push(ChatMessage::assistant(reply.clone()));
        reply
    }

    /// Attaches a translation to the most recent assistant message.
    pub fn annotate_last_reply(&mut self, translated: String) -> bool {
        match self
            .history
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::Assistant)
        {
            Some(msg) => {
                msg.translated_content = Some(translated);
                true
            }
            None => false,
        }
    }

    /// Returns an owned copy of the transcript.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    pub fn current_scenario(&self) -> Option<&'static Scenario> {
        self.scenario
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.scenario = None;
    }

    fn push(&mut self, msg: ChatMessage) {
        self.history.push_back(msg);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }
}
