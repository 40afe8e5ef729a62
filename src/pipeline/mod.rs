//! Pipeline stages that turn an uploaded file into text or into an image
//! payload for OCR.
//!
//! Each submodule implements exactly one transformation step, so a stage can
//! be swapped (e.g. a real PDF parser instead of the literal-string scraper)
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//!             ┌─▶ text ──────┐
//! document ──▶ dispatch ─▶ pdf_text ─┼─▶ plain text
//!             └─▶ office ────┘
//!
//! image ─────▶ encode (rescale + JPEG) ─┐
//!                                       ├─▶ base64 payload ─▶ OCR request
//! pdf ───────▶ render (page 1) ─▶ encode ┘
//! ```
//!
//! 1. [`dispatch`]: pick one [`dispatch::TextExtractor`] by declared type
//! 2. [`text`]: verbatim UTF-8 decode
//! 3. [`pdf_text`]: literal-string scraper over raw PDF bytes (heuristic)
//! 4. [`office`]: printable-character filter over raw container bytes (heuristic)
//! 5. [`encode`]: decode, bound to 1024 px, JPEG-encode, base64-wrap
//! 6. [`render`]: rasterise the first PDF page via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe

pub mod dispatch;
pub mod encode;
pub mod office;
pub mod pdf_text;
pub mod render;
pub mod text;
