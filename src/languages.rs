//! Language registry: single source of truth for supported languages.
//!
//! Each entry carries the metadata the quality assessor needs, most
//! importantly the language-specific sentence-ending punctuation used by the
//! sentence-structure checks. The registry is initialized once via `OnceLock`
//! and is immutable afterwards.

use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone)]
pub struct LanguageRules {
    /// ISO 639-1 language code (e.g., "en", "es", "fr")
    pub code: &'static str,

    /// English name of the language (e.g., "English", "Spanish")
    pub name: &'static str,

    /// Punctuation marks that may legitimately terminate a sentence
    pub sentence_endings: &'static [char],

    /// Whether sentences are expected to start with a capital letter
    pub capitalization: bool,
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageRules>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get the rules for a language by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageRules> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Rules for a language, falling back to English when the code is unknown.
    ///
    /// Quality assessment should degrade gracefully rather than fail when it
    /// meets a language the registry has no dedicated rules for.
    pub fn rules_or_default(&self, code: &str) -> &LanguageRules {
        self.get_by_code(code)
            .or_else(|| self.get_by_code("en"))
            .expect("registry always contains English")
    }

    /// All registered language codes.
    pub fn codes(&self) -> Vec<&'static str> {
        self.languages.iter().map(|lang| lang.code).collect()
    }

    /// Check if a language code is registered.
    pub fn is_supported(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

const LATIN_ENDINGS: &[char] = &['.', '!', '?'];
const SPANISH_ENDINGS: &[char] = &['.', '!', '?', '¿', '¡'];
const CJK_ENDINGS: &[char] = &['。', '！', '？', '.', '!', '?'];
const ARABIC_ENDINGS: &[char] = &['.', '!', '؟', '?'];
const HINDI_ENDINGS: &[char] = &['।', '.', '!', '?'];

/// The default set of supported languages.
fn default_languages() -> Vec<LanguageRules> {
    vec![
        LanguageRules {
            code: "en",
            name: "English",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "es",
            name: "Spanish",
            sentence_endings: SPANISH_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "fr",
            name: "French",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "de",
            name: "German",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "it",
            name: "Italian",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "pt",
            name: "Portuguese",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "ru",
            name: "Russian",
            sentence_endings: LATIN_ENDINGS,
            capitalization: true,
        },
        LanguageRules {
            code: "ja",
            name: "Japanese",
            sentence_endings: CJK_ENDINGS,
            capitalization: false,
        },
        LanguageRules {
            code: "ko",
            name: "Korean",
            sentence_endings: LATIN_ENDINGS,
            capitalization: false,
        },
        LanguageRules {
            code: "zh",
            name: "Chinese",
            sentence_endings: CJK_ENDINGS,
            capitalization: false,
        },
        LanguageRules {
            code: "ar",
            name: "Arabic",
            sentence_endings: ARABIC_ENDINGS,
            capitalization: false,
        },
        LanguageRules {
            code: "hi",
            name: "Hindi",
            sentence_endings: HINDI_ENDINGS,
            capitalization: false,
        },
    ]
}
