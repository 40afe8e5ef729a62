//! Error types for the edgequake-translate library.
//!
//! A single enum, [`TranslateError`], covers every failure the pipeline can
//! report. None of them is fatal to a [`crate::session::TranslationSession`]:
//! the caller surfaces the message and the user may retry with the same or a
//! different file. Nothing is retried automatically.
//!
//! The variants fall into two groups:
//!
//! * **Pipeline** failures: unsupported type, undecodable bytes, no usable
//!   text, PDF render failure, inference endpoint down, no encoder.
//! * **Ambient** failures: reading input files, writing the downloaded
//!   translation, invalid configuration.
//!
//! [`TranslateError::kind`] returns a flat [`ErrorKind`] tag so callers (and
//! tests) can branch on the category without matching every field.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-translate library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Pipeline errors ───────────────────────────────────────────────────
    /// No extractor accepts the declared media type / filename.
    #[error(
        "Unsupported file '{filename}' ({media_type})\n\
Supported: text/plain, application/pdf, .doc, .docx, .xls, .xlsx, and images for OCR."
    )]
    UnsupportedFormat { media_type: String, filename: String },

    /// Bytes could not be interpreted as the expected encoding or image.
    #[error("Could not decode input: {detail}")]
    DecodeError { detail: String },

    /// Decoding worked but no usable text was found.
    #[error("No usable text extracted from {format}: {reason}")]
    ExtractionFailed { format: String, reason: String },

    /// The PDF could not be parsed or its first page could not be rendered.
    #[error("PDF rendering failed: {detail}")]
    RenderError { detail: String },

    /// The inference endpoint was unreachable or answered with an error.
    #[error(
        "Inference server at '{endpoint}' is unavailable: {reason}\n\
Check that the server is running (e.g. `ollama serve`) and the model is pulled."
    )]
    InferenceUnavailable { endpoint: String, reason: String },

    /// No rendering surface or image encoder could be acquired.
    #[error(
        "Image encoding unavailable: {detail}\n\
For PDF rasterisation set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EncodingUnavailable { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// `translate` was asked to translate nothing.
    #[error("Source text is empty; enter or extract some text before translating")]
    EmptySourceText,

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the translation file.
    #[error("Failed to write translation file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Flat category of a [`TranslateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    DecodeError,
    ExtractionFailed,
    RenderError,
    InferenceUnavailable,
    EncodingUnavailable,
    FileNotFound,
    PermissionDenied,
    EmptySourceText,
    OutputWriteFailed,
    InvalidConfig,
    Internal,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            TranslateError::DecodeError { .. } => ErrorKind::DecodeError,
            TranslateError::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            TranslateError::RenderError { .. } => ErrorKind::RenderError,
            TranslateError::InferenceUnavailable { .. } => ErrorKind::InferenceUnavailable,
            TranslateError::EncodingUnavailable { .. } => ErrorKind::EncodingUnavailable,
            TranslateError::FileNotFound { .. } => ErrorKind::FileNotFound,
            TranslateError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            TranslateError::EmptySourceText => ErrorKind::EmptySourceText,
            TranslateError::OutputWriteFailed { .. } => ErrorKind::OutputWriteFailed,
            TranslateError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            TranslateError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn extraction_failed(format: &str, reason: impl Into<String>) -> Self {
        TranslateError::ExtractionFailed {
            format: format.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inference(endpoint: &str, reason: impl Into<String>) -> Self {
        TranslateError::InferenceUnavailable {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
