pub mod generator;
pub mod language;
pub mod message;
pub mod profile;
pub mod scenario;
pub mod session_state;
pub mod speech;
pub mod translation;
pub mod tutor;

pub use generator::{GenerationError, OpenAiGenerator, TextGenerator};
pub use language::{BASE_LANGUAGE, SUPPORTED_LANGUAGES, SupportedLanguage, find_language};
pub use message::{ChatMessage, Role};
pub use scenario::{SCENARIOS, Scenario};
pub use session_state::{SessionError, TutorSession};
pub use speech::{SpeechBridge, SpeechRecognizer, SpeechSynthesizer, Voice};
pub use translation::Translator;
pub use tutor::{ConversationMode, TutorError, TutorReply, VoiceTutor};
