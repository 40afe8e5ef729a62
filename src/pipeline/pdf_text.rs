//! Heuristic PDF text extraction: scrape literal strings out of raw bytes.
//!
//! ## Known limitation
//!
//! This is not a PDF parser. The whole file is decoded as (lossy) UTF-8 and
//! every `( ... )` literal on a single line is taken as text. Consequences:
//!
//! - escape sequences (`\(`, `\)`, `\n`, octal) are not unescaped;
//! - text inside compressed (`/FlateDecode`) content streams is invisible;
//! - literals from metadata, annotations and fonts show up as noise.
//!
//! For anything but trivially-structured PDFs, rasterise the first page with
//! [`crate::pipeline::render`] and OCR it instead, or register a real parser
//! with [`crate::pipeline::dispatch::DocumentDispatcher::with_extractor`].

use crate::document::DeclaredType;
use crate::error::TranslateError;
use crate::pipeline::dispatch::TextExtractor;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Minimum number of characters a literal needs to be kept.
pub const MIN_LITERAL_CHARS: usize = 3;

// Non-greedy, and never across a line terminator.
static RE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^\n\r\u{2028}\u{2029}]*?)\)").unwrap());

/// Accepts `application/pdf` and returns its parenthesised literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLiteralExtractor;

impl TextExtractor for PdfLiteralExtractor {
    fn name(&self) -> &'static str {
        "pdf-literal"
    }

    fn accepts(&self, declared: &DeclaredType) -> bool {
        declared.is_pdf()
    }

    fn try_extract(&self, bytes: &[u8], _declared: &DeclaredType) -> Result<String, TranslateError> {
        scrape_literals(bytes)
    }
}

/// Space-joined literals of at least [`MIN_LITERAL_CHARS`] characters, in
/// byte-offset order.
pub fn scrape_literals(bytes: &[u8]) -> Result<String, TranslateError> {
    let text = String::from_utf8_lossy(bytes);

    let mut total = 0usize;
    let kept: Vec<&str> = RE_LITERAL
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .inspect(|_| total += 1)
        .map(|m| m.as_str())
        .filter(|s| s.chars().count() >= MIN_LITERAL_CHARS)
        .collect();

    debug!("PDF literal scan: {} matches, {} kept", total, kept.len());

    if kept.is_empty() {
        return Err(TranslateError::extraction_failed(
            "PDF",
            "no literal text strings found (the PDF may be compressed or scanned; try OCR)",
        ));
    }

    Ok(kept.join(" "))
}
