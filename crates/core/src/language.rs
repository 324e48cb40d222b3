use serde::Serialize;

/// Language every prompt is written in. Selecting it disables translation.
pub const BASE_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedLanguage {
    pub code: &'static str,
    pub name: &'static str,
    /// Locale tag handed to the speech engines.
    pub speech_lang: &'static str,
    /// Preferred synthesis voices, best first.
    pub voice_names: &'static [&'static str],
    /// Name used in translation prompts.
    pub translation_name: &'static str,
}

impl SupportedLanguage {
    /// Primary subtag of the speech locale, e.g. `hi` for `hi-IN`.
    pub fn locale_prefix(&self) -> &'static str {
        locale_prefix(self.speech_lang)
    }
}

pub(crate) fn locale_prefix(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

pub static SUPPORTED_LANGUAGES: [SupportedLanguage; 5] = [
    SupportedLanguage {
        code: "en",
        name: "English",
        speech_lang: "en-US",
        voice_names: &[
            "Microsoft Zira - English (United States)",
            "Microsoft David - English (United States)",
            "Google US English",
        ],
        translation_name: "English",
    },
    SupportedLanguage {
        code: "hi",
        name: "हिंदी (Hindi)",
        speech_lang: "hi-IN",
        voice_names: &[
            "Microsoft Hemant - Hindi (India)",
            "Google हिन्दी",
            "Microsoft Kalpana - Hindi (India)",
        ],
        translation_name: "Hindi (हिंदी)",
    },
    SupportedLanguage {
        code: "mr",
        name: "मराठी (Marathi)",
        speech_lang: "mr-IN",
        voice_names: &["Microsoft Manohar - Marathi (India)", "Google मराठी"],
        translation_name: "Marathi (मराठी)",
    },
    SupportedLanguage {
        code: "gu",
        name: "ગુજરાતી (Gujarati)",
        speech_lang: "gu-IN",
        voice_names: &["Microsoft Kalika - Gujarati (India)", "Google ગુજરાતી"],
        translation_name: "Gujarati (ગુજરાતી)",
    },
    SupportedLanguage {
        code: "ta",
        name: "தமிழ் (Tamil)",
        speech_lang: "ta-IN",
        voice_names: &["Microsoft Valluvar - Tamil (India)", "Google தமிழ்"],
        translation_name: "Tamil (தமிழ்)",
    },
];

pub fn find_language(code: &str) -> Option<&'static SupportedLanguage> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}
