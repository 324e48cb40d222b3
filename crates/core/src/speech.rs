//! Speech bridge
//!
//! Presents a platform's speech-to-text and text-to-speech engines as two
//! awaitable calls, `listen` and `speak`. The engines themselves are external
//! and sit behind the [`SpeechRecognizer`] and [`SpeechSynthesizer`] traits; a
//! bridge built without one of them reports that capability as unsupported.

use crate::language::{BASE_LANGUAGE, find_language, locale_prefix};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

const SPEECH_RATE: f32 = 0.9;
const SPEECH_PITCH: f32 = 1.1;
const SPEECH_VOLUME: f32 = 1.0;

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub name: String,
    /// BCP-47 locale tag, e.g. `en-US`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// One request to the synthesis engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    /// `None` lets the engine use its default voice for `lang`.
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("Speech recognition not supported")]
    Unsupported,
    #[error("Already listening")]
    AlreadyListening,
    #[error("No speech was detected")]
    NoSpeech,
    #[error("Speech recognition was aborted")]
    Aborted,
    #[error("Speech recognition error: {0}")]
    Engine(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("Speech synthesis not supported")]
    Unsupported,
    #[error("Speech synthesis was interrupted")]
    Interrupted,
    #[error("Speech synthesis error: {0}")]
    Engine(String),
}

/// Platform speech-to-text engine. Yields one final transcript per call.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, locale: &str) -> Result<String, RecognitionError>;

    /// Stops a recognition in progress; the pending call should resolve
    /// with [`RecognitionError::Aborted`].
    fn abort(&self);
}

/// Platform text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<Voice>;

    /// Plays the utterance and resolves once playback has finished.
    async fn speak(&self, utterance: Utterance) -> Result<(), SynthesisError>;

    /// Cancels any playback in progress.
    fn cancel(&self);
}

/// Picks the best voice for `language_code`.
///
/// Curated voice names for the language win; otherwise the first voice whose
/// locale shares the language's primary subtag is used. `None` means the
/// engine default will speak.
pub fn select_voice(voices: &[Voice], language_code: &str) -> Option<Voice> {
    let language = find_language(language_code);

    if let Some(language) = language {
        for preferred in language.voice_names {
            let key = preferred.split(" - ").next().unwrap_or(preferred);
            if let Some(voice) = voices.iter().find(|v| v.name.contains(key)) {
                return Some(voice.clone());
            }
        }
    }

    let prefix = language
        .map(|l| l.locale_prefix())
        .unwrap_or_else(|| locale_prefix(language_code));
    voices.iter().find(|v| v.lang.starts_with(prefix)).cloned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenState {
    Idle,
    /// Carries the ticket of the `listen` call that owns the recognizer.
    Active(u64),
}

struct ListenSlot {
    state: ListenState,
    next_ticket: u64,
}

/// Returns the slot to idle when the owning `listen` call finishes or is dropped.
struct ListenTicket<'a> {
    slot: &'a Mutex<ListenSlot>,
    ticket: u64,
}

impl Drop for ListenTicket<'_> {
    fn drop(&mut self) {
        let mut slot = lock(self.slot);
        if slot.state == ListenState::Active(self.ticket) {
            slot.state = ListenState::Idle;
        }
    }
}

fn lock(slot: &Mutex<ListenSlot>) -> MutexGuard<'_, ListenSlot> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SpeechBridge {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    language: String,
    selected_voice: Option<Voice>,
    listen: Mutex<ListenSlot>,
}

impl Default for SpeechBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechBridge {
    /// A bridge with no engines attached; both capabilities are unsupported.
    pub fn new() -> Self {
        Self {
            recognizer: None,
            synthesizer: None,
            language: BASE_LANGUAGE.to_string(),
            selected_voice: None,
            listen: Mutex::new(ListenSlot {
                state: ListenState::Idle,
                next_ticket: 0,
            }),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self.refresh_voices();
        self
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some() && self.synthesizer.is_some()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn selected_voice(&self) -> Option<&Voice> {
        self.selected_voice.as_ref()
    }

    pub fn is_listening(&self) -> bool {
        matches!(lock(&self.listen).state, ListenState::Active(_))
    }

    /// Switches the recognition and synthesis language and re-selects a voice.
    pub fn set_language(&mut self, code: &str) {
        self.language = code.to_string();
        self.refresh_voices();
    }

    /// Re-runs voice selection against the engine's current voice list.
    pub fn refresh_voices(&mut self) {
        let voices = self
            .synthesizer
            .as_ref()
            .map(|s| s.voices())
            .unwrap_or_default();

        self.selected_voice = select_voice(&voices, &self.language);
        match &self.selected_voice {
            Some(voice) => {
                tracing::info!("Selected voice '{}' for language '{}'", voice.name, self.language)
            }
            None => tracing::warn!(
                "No voice found for language '{}'; using engine default",
                self.language
            ),
        }
    }

    /// Voices that suit the current language, by locale or curated name.
    pub fn available_voices(&self) -> Vec<Voice> {
        let Some(synthesizer) = &self.synthesizer else {
            return Vec::new();
        };
        let language = find_language(&self.language);
        let prefix = language
            .map(|l| l.locale_prefix())
            .unwrap_or_else(|| locale_prefix(&self.language));

        synthesizer
            .voices()
            .into_iter()
            .filter(|v| {
                v.lang.starts_with(prefix)
                    || language.is_some_and(|l| {
                        l.voice_names.iter().any(|name| {
                            v.name
                                .contains(name.split(" - ").next().unwrap_or(name))
                        })
                    })
            })
            .collect()
    }

    fn speech_locale(&self) -> String {
        find_language(&self.language)
            .map(|l| l.speech_lang.to_string())
            .unwrap_or_else(|| self.language.clone())
    }

    /// Captures one utterance. Only one `listen` may be outstanding.
    pub async fn listen(&self) -> Result<String, RecognitionError> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or(RecognitionError::Unsupported)?;

        let ticket = {
            let mut slot = lock(&self.listen);
            if slot.state != ListenState::Idle {
                return Err(RecognitionError::AlreadyListening);
            }
            let ticket = slot.next_ticket;
            slot.next_ticket += 1;
            slot.state = ListenState::Active(ticket);
            ListenTicket {
                slot: &self.listen,
                ticket,
            }
        };

        let locale = self.speech_locale();
        tracing::debug!("Listening for speech ({})", locale);
        let result = recognizer.recognize(&locale).await;
        drop(ticket);

        match &result {
            Ok(text) => tracing::debug!("Recognized: \"{}\"", text),
            Err(e) => tracing::warn!("Recognition ended without a transcript: {}", e),
        }
        result
    }

    /// Best-effort; does nothing when not listening.
    pub fn stop_listening(&self) {
        let mut slot = lock(&self.listen);
        if let ListenState::Active(_) = slot.state {
            if let Some(recognizer) = &self.recognizer {
                recognizer.abort();
            }
            slot.state = ListenState::Idle;
        }
    }

    /// Speaks `text`, replacing anything currently playing.
    pub async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or(SynthesisError::Unsupported)?;

        synthesizer.cancel();

        let lang = match &self.selected_voice {
            Some(voice) => voice.lang.clone(),
            None => self.speech_locale(),
        };
        let utterance = Utterance {
            text: text.to_string(),
            lang,
            voice: self.selected_voice.clone(),
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
            volume: SPEECH_VOLUME,
        };
        synthesizer.speak(utterance).await
    }

    /// Best-effort; safe to call when nothing is playing.
    pub fn stop_speaking(&self) {
        if let Some(synthesizer) = &self.synthesizer {
            synthesizer.cancel();
        }
    }
}
