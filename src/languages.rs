//! Supported languages and their display names.
//!
//! Requests to the model use display names ("Türkçe"), while the session and
//! downloaded file names use short codes ("tr").

/// Source-language code meaning "let the model detect it".
pub const AUTO: &str = "auto";

/// Name sent to the model when the source language is not known.
pub const AUTO_DETECT_NAME: &str = "auto-detect";

/// Name sent to the model when the target code is not in [`LANGUAGES`].
pub const FALLBACK_TARGET_NAME: &str = "Turkish";

/// A selectable language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Languages offered for translation.
pub const LANGUAGES: &[Language] = &[
    Language { code: "tr", name: "Türkçe" },
    Language { code: "en", name: "English" },
    Language { code: "fr", name: "Français" },
    Language { code: "de", name: "Deutsch" },
    Language { code: "ro", name: "Română" },
];

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Name to send for a source-language code.
pub fn source_name(code: &str) -> &'static str {
    find(code).map(|l| l.name).unwrap_or(AUTO_DETECT_NAME)
}

/// Name to send for a target-language code.
pub fn target_name(code: &str) -> &'static str {
    find(code).map(|l| l.name).unwrap_or(FALLBACK_TARGET_NAME)
}
