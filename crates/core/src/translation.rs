use crate::generator::TextGenerator;
use crate::language::{BASE_LANGUAGE, find_language};
use std::sync::Arc;

/// Translates tutor replies into the learner's chosen language.
///
/// Translation is best effort: any failure hands back the English text.
pub struct Translator {
    generator: Arc<dyn TextGenerator>,
}

impl Translator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn translate_to_language(&self, text: &str, target: &str) -> String {
        if target == BASE_LANGUAGE {
            return text.to_string();
        }

        let target_name = find_language(target)
            .map(|l| l.translation_name)
            .unwrap_or(target);
        let prompt = translation_prompt(text, target_name);

        match self.generator.generate(&prompt).await {
            Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Translation to '{}' came back empty; using original", target);
                text.to_string()
            }
            Err(e) => {
                tracing::warn!("Translation to '{}' failed: {}; using original", target, e);
                text.to_string()
            }
        }
    }
}

fn translation_prompt(text: &str, target_name: &str) -> String {
    format!(
        "Translate the following English text to {target_name}. Keep the translation natural and conversational, suitable for language learning. Maintain the friendly and encouraging tone.\n\nEnglish text: \"{text}\"\n\nTranslated text:"
    )
}
