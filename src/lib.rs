//! # edgequake-translate
//!
//! Extract text from images, PDFs and office documents, then translate it
//! with a local Ollama-compatible LLM server.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ image/*          normalise (≤1024 px, JPEG q80) ─┐
//!  ├─ application/pdf  render page 1 (pdfium, 2.0×) ───┼─▶ OCR  (/api/generate + images)
//!  │                                                   │
//!  ├─ text/plain  ─┐                                   │
//!  ├─ pdf literals ├─ heuristic text extraction ───────┤
//!  └─ .doc/.xls   ─┘                                   ▼
//!                                               source text buffer
//!                                                      │
//!                                   translate (/api/generate, prompt only)
//!                                                      │
//!                                   translated buffer ─▶ translation_*.txt
//! ```
//!
//! A background [`health::HealthMonitor`] probes `/api/tags` every 30 s and
//! publishes the [`health::ConnectionState`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_translate::{TranslationSession, TranslatorConfig, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = TranslationSession::start(TranslatorConfig::default())?;
//!     let file = UploadedFile::from_path("scan.png").await?;
//!     session.ocr_file(&file).await?;
//!     session.set_languages("auto", "en")?;
//!     println!("{}", session.translate().await?);
//!     session.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr-translate` binary (clap + anyhow + tracing-subscriber + indicatif + futures) |
//! | `bundled` | off   | Embeds libpdfium at build time (needs `PDFIUM_BUNDLE_LIB`) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-translate = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDF rendering
//!
//! OCR of PDFs needs the pdfium shared library at runtime. On first use it
//! is downloaded (~30 MB) by `pdfium-auto` and cached; set `PDFIUM_LIB_PATH`
//! to use an existing copy, or build with `--features bundled` to embed it.
//! See [`pipeline::render`] for the full lookup order.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod download;
pub mod error;
pub mod health;
pub mod inference;
pub mod languages;
pub mod pipeline;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{TranslatorConfig, TranslatorConfigBuilder};
pub use document::{Base64Payload, DeclaredType, PayloadKind, UploadedFile};
pub use download::{artifact_filename, artifact_stem, save_text};
pub use error::{ErrorKind, TranslateError};
pub use health::{ConnectionState, HealthMonitor};
pub use inference::{InferenceClient, InferenceConfig};
pub use pipeline::dispatch::{DocumentDispatcher, TextExtractor};
pub use pipeline::encode::ImageNormalizer;
pub use pipeline::render::PdfRasterizer;
pub use session::{SessionState, TranslationSession};
