//! Document dispatch: route an uploaded file to exactly one extractor.
//!
//! Extractors are interchangeable strategies behind [`TextExtractor`]. The
//! dispatcher walks its strategies in order and hands the file to the first
//! one that accepts the declared type. The default order encodes the
//! precedence rules:
//!
//! 1. exact MIME `text/plain`       → [`PlainTextExtractor`]
//! 2. exact MIME `application/pdf`  → [`PdfLiteralExtractor`]
//! 3. `.doc` / `.docx` suffix       → [`OfficeExtractor`] (word processor)
//! 4. `.xls` / `.xlsx` suffix       → [`OfficeExtractor`] (spreadsheet)
//! 5. anything else                 → [`TranslateError::UnsupportedFormat`]

use crate::document::{DeclaredType, UploadedFile};
use crate::error::TranslateError;
use crate::pipeline::office::OfficeExtractor;
use crate::pipeline::pdf_text::PdfLiteralExtractor;
use crate::pipeline::text::PlainTextExtractor;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A strategy that turns the bytes of one kind of file into text.
pub trait TextExtractor: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy handles the declared type.
    fn accepts(&self, declared: &DeclaredType) -> bool;

    /// Extract text, all-or-nothing.
    fn try_extract(&self, bytes: &[u8], declared: &DeclaredType) -> Result<String, TranslateError>;
}

/// Ordered set of [`TextExtractor`] strategies.
#[derive(Clone)]
pub struct DocumentDispatcher {
    extractors: Vec<Arc<dyn TextExtractor>>,
}

impl Default for DocumentDispatcher {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(PlainTextExtractor),
            Arc::new(PdfLiteralExtractor),
            Arc::new(OfficeExtractor::word()),
            Arc::new(OfficeExtractor::spreadsheet()),
        ])
    }
}

impl fmt::Debug for DocumentDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|e| e.name()))
            .finish()
    }
}

impl DocumentDispatcher {
    pub fn new(extractors: Vec<Arc<dyn TextExtractor>>) -> Self {
        Self { extractors }
    }

    /// Put `extractor` ahead of every existing strategy.
    ///
    /// Used to substitute a real parser for one of the heuristic extractors
    /// while keeping the routing contract intact.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(0, extractor);
        self
    }

    /// Names of the registered strategies, in precedence order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// The strategy that would handle `declared`.
    pub fn select(&self, declared: &DeclaredType) -> Result<&dyn TextExtractor, TranslateError> {
        self.extractors
            .iter()
            .find(|e| e.accepts(declared))
            .map(|e| &**e)
            .ok_or_else(|| TranslateError::UnsupportedFormat {
                media_type: if declared.media_type.is_empty() {
                    "unknown type".to_string()
                } else {
                    declared.media_type.clone()
                },
                filename: declared.filename.clone(),
            })
    }

    /// Extract text from `file` with the selected strategy, unchanged.
    pub fn extract(&self, file: &UploadedFile) -> Result<String, TranslateError> {
        let extractor = self.select(file.declared())?;
        debug!(
            "Dispatching '{}' ({}, {} bytes) to {}",
            file.filename(),
            file.media_type(),
            file.len(),
            extractor.name()
        );
        extractor.try_extract(file.bytes(), file.declared())
    }
}
