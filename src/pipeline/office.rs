//! Heuristic office-document extraction: keep the printable characters.
//!
//! Word-processor (`.doc`, `.docx`) and spreadsheet (`.xls`, `.xlsx`) files
//! go through the same filter. The raw container bytes are decoded as lossy
//! UTF-8, every character outside the printable ranges becomes a space,
//! whitespace runs collapse, and the result must be at least
//! [`MIN_USABLE_CHARS`] long.
//!
//! This does not open the ZIP (OOXML) or OLE container. Real files mostly
//! yield compressed-stream garbage or nothing at all; that is the expected
//! outcome of this extractor. Plug a real parser in through
//! [`crate::pipeline::dispatch::DocumentDispatcher::with_extractor`] when
//! better results are needed.

use crate::document::DeclaredType;
use crate::error::TranslateError;
use crate::pipeline::dispatch::TextExtractor;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Filtered text shorter than this counts as "no usable text".
pub const MIN_USABLE_CHARS: usize = 10;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\u{FEFF}]+").unwrap());

/// Which office family an [`OfficeExtractor`] handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeKind {
    WordProcessor,
    Spreadsheet,
}

impl OfficeKind {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            OfficeKind::WordProcessor => &["doc", "docx"],
            OfficeKind::Spreadsheet => &["xls", "xlsx"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OfficeKind::WordProcessor => "Word document",
            OfficeKind::Spreadsheet => "Excel workbook",
        }
    }
}

/// Accepts office files by filename extension.
#[derive(Debug, Clone, Copy)]
pub struct OfficeExtractor {
    kind: OfficeKind,
}

impl OfficeExtractor {
    pub fn new(kind: OfficeKind) -> Self {
        Self { kind }
    }

    pub fn word() -> Self {
        Self::new(OfficeKind::WordProcessor)
    }

    pub fn spreadsheet() -> Self {
        Self::new(OfficeKind::Spreadsheet)
    }

    pub fn kind(&self) -> OfficeKind {
        self.kind
    }
}

impl TextExtractor for OfficeExtractor {
    fn name(&self) -> &'static str {
        match self.kind {
            OfficeKind::WordProcessor => "office-word",
            OfficeKind::Spreadsheet => "office-spreadsheet",
        }
    }

    fn accepts(&self, declared: &DeclaredType) -> bool {
        self.kind
            .extensions()
            .iter()
            .any(|ext| declared.has_extension(ext))
    }

    fn try_extract(&self, bytes: &[u8], _declared: &DeclaredType) -> Result<String, TranslateError> {
        let text = printable_text(bytes);
        let chars = text.chars().count();
        debug!("{}: {} printable chars kept", self.kind.label(), chars);

        if chars < MIN_USABLE_CHARS {
            return Err(TranslateError::extraction_failed(
                self.kind.label(),
                format!("only {chars} printable characters found (need {MIN_USABLE_CHARS})"),
            ));
        }
        Ok(text)
    }
}

fn is_printable(c: char) -> bool {
    matches!(c, '\u{20}'..='\u{7E}') || c >= '\u{A0}'
}

/// Lossy decode, blank out non-printables, collapse whitespace, trim.
pub fn printable_text(bytes: &[u8]) -> String {
    let filtered: String = String::from_utf8_lossy(bytes)
        .chars()
        .map(|c| if is_printable(c) { c } else { ' ' })
        .collect();
    RE_WHITESPACE
        .replace_all(&filtered, " ")
        .trim()
        .to_string()
}
