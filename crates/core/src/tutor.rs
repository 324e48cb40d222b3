use crate::language::BASE_LANGUAGE;
use crate::session_state::{SessionError, TutorSession};
use crate::speech::{RecognitionError, SpeechBridge, SynthesisError};
use crate::translation::Translator;

/// How a conversation begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationMode {
    FreeFlow,
    Scenario(String),
}

impl ConversationMode {
    /// `free` (or an empty string) selects free-flow; anything else is a scenario id.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "free" | "free-flow" => ConversationMode::FreeFlow,
            id => ConversationMode::Scenario(id.to_string()),
        }
    }
}

/// What the tutor said on a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorReply {
    /// Learner utterance that triggered the reply; `None` for the welcome.
    pub heard: Option<String>,
    /// English reply as recorded in the transcript.
    pub text: String,
    /// Translation into the selected language, when one was made.
    pub translated: Option<String>,
    pub spoken: bool,
}

impl TutorReply {
    /// Text that was (or would have been) spoken aloud.
    pub fn display_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

impl TutorError {
    /// Child-facing line shown instead of the raw error.
    pub fn friendly_message(&self) -> &'static str {
        match self {
            TutorError::Session(_) => "Oops! Magic is taking a break. Try again soon!",
            TutorError::Recognition(RecognitionError::Unsupported)
            | TutorError::Synthesis(SynthesisError::Unsupported) => {
                "Speech magic doesn't work here. Try a different device!"
            }
            TutorError::Recognition(RecognitionError::AlreadyListening) => {
                "I'm already listening! Go ahead and speak."
            }
            TutorError::Recognition(_) | TutorError::Synthesis(_) => {
                "Whoops! I missed that. Try speaking again!"
            }
        }
    }
}

/// Drives a spoken conversation: capture, reply, translate, speak.
pub struct VoiceTutor {
    session: TutorSession,
    translator: Translator,
    speech: SpeechBridge,
}

impl VoiceTutor {
    pub fn new(session: TutorSession, translator: Translator, speech: SpeechBridge) -> Self {
        Self {
            session,
            translator,
            speech,
        }
    }

    pub fn session(&self) -> &TutorSession {
        &self.session
    }

    pub fn speech(&self) -> &SpeechBridge {
        &self.speech
    }

    pub fn language(&self) -> &str {
        self.speech.language()
    }

    pub fn set_language(&mut self, code: &str) {
        self.speech.set_language(code);
    }

    /// Starts a new conversation and speaks its greeting.
    pub async fn start(&mut self, mode: &ConversationMode) -> Result<TutorReply, TutorError> {
        let welcome = match mode {
            ConversationMode::FreeFlow => self.session.start_free_flow(),
            ConversationMode::Scenario(id) => self.session.start_scenario(id)?,
        };
        Ok(self.deliver(None, welcome).await)
    }

    /// Runs one learner turn. Recognition problems are returned so the caller
    /// can prompt a retry; model problems already arrive as fallback replies.
    pub async fn take_turn(&mut self) -> Result<TutorReply, TutorError> {
        let heard = self.speech.listen().await?;
        let heard = heard.trim().to_string();
        if heard.is_empty() {
            return Err(RecognitionError::NoSpeech.into());
        }

        let reply = self.session.send_message(&heard).await;
        Ok(self.deliver(Some(heard), reply).await)
    }

    /// Stops any speech activity and discards the conversation.
    pub fn end(&mut self) {
        self.speech.stop_listening();
        self.speech.stop_speaking();
        self.session.clear();
        tracing::info!("Conversation ended");
    }

    async fn deliver(&mut self, heard: Option<String>, text: String) -> TutorReply {
        let language = self.speech.language().to_string();
        let translated = if language == BASE_LANGUAGE {
            None
        } else {
            let translated = self.translator.translate_to_language(&text, &language).await;
            self.session.annotate_last_reply(translated.clone());
            Some(translated)
        };

        let mut reply = TutorReply {
            heard,
            text,
            translated,
            spoken: false,
        };

        match self.speech.speak(reply.display_text()).await {
            Ok(()) => reply.spoken = true,
            Err(e) => tracing::warn!("Could not speak reply: {}", e),
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GenerationError, MockTextGenerator, TextGenerator};
    use crate::session_state::{FALLBACK_GENERIC, FREE_FLOW_WELCOME};
    use crate::speech::{SpeechRecognizer, SpeechSynthesizer, Utterance, Voice};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedRecognizer {
        lines: Mutex<VecDeque<Result<String, RecognitionError>>>,
    }

    impl ScriptedRecognizer {
        fn new(lines: Vec<Result<String, RecognitionError>>) -> Self {
            Self {
                lines: Mutex::new(lines.into()),
            }
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn recognize(&self, _locale: &str) -> Result<String, RecognitionError> {
            self.lines
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(RecognitionError::Aborted))
        }

        fn abort(&self) {}
    }

    #[derive(Default)]
    struct Speaker {
        spoken: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for Speaker {
        fn voices(&self) -> Vec<Voice> {
            vec![Voice::new("Lekha", "hi-IN")]
        }

        async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError> {
            if self.fail {
                return Err(SynthesisError::Engine("audio device busy".into()));
            }
            self.spoken.lock().unwrap().push(utterance.text);
            Ok(())
        }

        fn cancel(&self) {}
    }

    fn tutor(
        generator: MockTextGenerator,
        lines: Vec<Result<String, RecognitionError>>,
        speaker: Arc<Speaker>,
    ) -> VoiceTutor {
        let generator: Arc<dyn TextGenerator> = Arc::new(generator);
        let speech = SpeechBridge::new()
            .with_recognizer(Arc::new(ScriptedRecognizer::new(lines)))
            .with_synthesizer(speaker);
        VoiceTutor::new(
            TutorSession::new(generator.clone()),
            Translator::new(generator),
            speech,
        )
    }

    #[test]
    fn parses_conversation_mode() {
        assert_eq!(ConversationMode::parse("free"), ConversationMode::FreeFlow);
        assert_eq!(ConversationMode::parse(""), ConversationMode::FreeFlow);
        assert_eq!(
            ConversationMode::parse("store"),
            ConversationMode::Scenario("store".to_string())
        );
    }

    #[tokio::test]
    async fn english_turn_is_spoken_untranslated() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("Apples are tasty! What colour do you like?".to_string()));
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(generator, vec![Ok(" I like apples ".into())], speaker.clone());

        let welcome = tutor.start(&ConversationMode::FreeFlow).await.unwrap();
        let reply = tutor.take_turn().await.unwrap();

        assert_eq!(welcome.text, FREE_FLOW_WELCOME);
        assert_eq!(reply.heard.as_deref(), Some("I like apples"));
        assert!(reply.translated.is_none());
        assert!(reply.spoken);
        assert_eq!(
            *speaker.spoken.lock().unwrap(),
            vec![
                FREE_FLOW_WELCOME.to_string(),
                "Apples are tasty! What colour do you like?".to_string()
            ]
        );
        assert_eq!(tutor.session().history().len(), 3);
    }

    #[tokio::test]
    async fn non_english_replies_are_translated_and_recorded() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|prompt| {
                if prompt.starts_with("Translate") {
                    Ok("अनुवाद".to_string())
                } else {
                    Ok("Great job!".to_string())
                }
            });
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(generator, vec![Ok("Hello".into())], speaker.clone());
        tutor.set_language("hi");

        tutor.start(&ConversationMode::Scenario("store".into())).await.unwrap();
        let reply = tutor.take_turn().await.unwrap();

        assert_eq!(reply.text, "Great job!");
        assert_eq!(reply.translated.as_deref(), Some("अनुवाद"));
        assert_eq!(reply.display_text(), "अनुवाद");
        let history = tutor.session().history();
        assert_eq!(history[0].translated_content.as_deref(), Some("अनुवाद"));
        assert_eq!(history[2].translated_content.as_deref(), Some("अनुवाद"));
        assert!(history[1].translated_content.is_none());
    }

    #[tokio::test]
    async fn unknown_scenario_propagates() {
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(MockTextGenerator::new(), vec![], speaker.clone());

        let err = tutor
            .start(&ConversationMode::Scenario("zoo".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, TutorError::Session(SessionError::ScenarioNotFound(_))));
        assert_eq!(err.friendly_message(), "Oops! Magic is taking a break. Try again soon!");
        assert!(speaker.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recognition_failure_asks_for_a_retry() {
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(
            MockTextGenerator::new(),
            vec![Err(RecognitionError::Engine("no-speech".into())), Ok("   ".into())],
            speaker,
        );
        tutor.start(&ConversationMode::FreeFlow).await.unwrap();

        let err = tutor.take_turn().await.unwrap_err();
        assert_eq!(err.friendly_message(), "Whoops! I missed that. Try speaking again!");

        let err = tutor.take_turn().await.unwrap_err();
        assert!(matches!(err, TutorError::Recognition(RecognitionError::NoSpeech)));
        assert_eq!(tutor.session().history().len(), 1);
    }

    #[tokio::test]
    async fn model_failure_is_spoken_as_fallback() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(GenerationError::Request("timeout".into())));
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(generator, vec![Ok("Hello".into())], speaker.clone());
        tutor.start(&ConversationMode::FreeFlow).await.unwrap();

        let reply = tutor.take_turn().await.unwrap();

        assert_eq!(reply.text, FALLBACK_GENERIC);
        assert_eq!(speaker.spoken.lock().unwrap().last().unwrap(), FALLBACK_GENERIC);
    }

    #[tokio::test]
    async fn synthesis_failure_keeps_the_reply() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("Well said!".to_string()));
        let speaker = Arc::new(Speaker {
            fail: true,
            ..Default::default()
        });
        let mut tutor = tutor(generator, vec![Ok("Hello".into())], speaker);
        tutor.start(&ConversationMode::FreeFlow).await.unwrap();

        let reply = tutor.take_turn().await.unwrap();

        assert_eq!(reply.text, "Well said!");
        assert!(!reply.spoken);
    }

    #[tokio::test]
    async fn end_discards_the_conversation() {
        let speaker = Arc::new(Speaker::default());
        let mut tutor = tutor(MockTextGenerator::new(), vec![], speaker);
        tutor.start(&ConversationMode::Scenario("home".into())).await.unwrap();

        tutor.end();

        assert!(tutor.session().history().is_empty());
        assert!(tutor.session().current_scenario().is_none());
        assert!(!tutor.speech().is_listening());
    }
}
