//! Prompts sent to the inference server.
//!
//! Both prompts are defaults only: [`crate::config::TranslatorConfig`] carries
//! the strings actually used, so callers can override them without touching
//! the client.

/// Default instruction for OCR requests. The image travels in `images`.
pub const DEFAULT_OCR_PROMPT: &str =
    "Extract all text from this image. Only return the extracted text, nothing else.";

/// Default translation prompt template.
///
/// Placeholders: `{source}` (source language name or `auto-detect`),
/// `{target}` (target language name) and `{text}` (the text body).
pub const DEFAULT_TRANSLATION_PROMPT: &str = "You are a professional translator. \
Translate the following text from {source} to {target}. \
Only return the translation, nothing else:\n\n{text}";

/// Fill a translation template.
///
/// `{text}` is substituted last so placeholder-like sequences inside the
/// user's text are left alone.
pub fn translation_prompt(template: &str, source: &str, target: &str, text: &str) -> String {
    let head = template
        .replace("{source}", source)
        .replace("{target}", target);
    match head.split_once("{text}") {
        Some((before, after)) => format!("{before}{text}{after}"),
        None => format!("{head}\n\n{text}"),
    }
}
