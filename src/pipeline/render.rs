//! PDF rasterisation: render the first page to a JPEG payload via pdfium.
//!
//! ## spawn_blocking
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async contexts. [`PdfRasterizer::rasterize`]
//! moves the work onto Tokio's blocking pool so worker threads never stall on
//! CPU-heavy rendering.
//!
//! ## Library binding
//!
//! pdfium is loaded at runtime. Candidates, in order:
//!
//! 1. the explicitly configured path ([`TranslatorConfig::pdfium_library_path`]);
//! 2. [`pdfium_auto`]: `PDFIUM_LIB_PATH`, then the local cache, then a
//!    one-time download of the platform binary into that cache (or the
//!    embedded copy when built with the `bundled` feature);
//! 3. the system library search path.
//!
//! If none binds there is no rendering surface, which is reported as
//! [`TranslateError::EncodingUnavailable`]. Step 2 may block on the network
//! the first time, so bind from blocking contexts only.
//!
//! Only page 1 is ever rendered. Multi-page PDFs are OCR'd from their first
//! page alone.

use crate::config::TranslatorConfig;
use crate::document::Base64Payload;
use crate::error::TranslateError;
use crate::pipeline::encode::ImageNormalizer;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Environment variable naming an existing pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium using the candidate order described in the module docs.
///
/// Blocking.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, TranslateError> {
    if let Some(path) = explicit {
        match pdfium_auto::bind_pdfium_from_path(path) {
            Ok(pdfium) => {
                debug!("Bound pdfium from {}", path.display());
                return Ok(pdfium);
            }
            Err(e) => warn!("{}; trying the managed library", e),
        }
    }

    let managed = match pdfium_auto::bind_pdfium_silent() {
        Ok(pdfium) => {
            debug!("Bound pdfium from the pdfium-auto cache");
            return Ok(pdfium);
        }
        Err(e) => e,
    };

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| TranslateError::EncodingUnavailable {
            detail: format!(
                "pdfium library could not be loaded ({managed}); \
                 system library: {e}. Set {PDFIUM_LIB_ENV} to an existing libpdfium"
            ),
        })
}

/// Renders the first page of a PDF and encodes it for OCR.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    scale: f32,
    library_path: Option<PathBuf>,
    normalizer: ImageNormalizer,
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self::new(2.0, None, ImageNormalizer::default())
    }
}

impl PdfRasterizer {
    pub fn new(scale: f32, library_path: Option<PathBuf>, normalizer: ImageNormalizer) -> Self {
        Self {
            scale,
            library_path,
            normalizer,
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(
            config.pdf_render_scale,
            config.pdfium_library_path.clone(),
            ImageNormalizer::from_config(config),
        )
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Render page 1 of `bytes` at the configured scale.
    ///
    /// Blocking; call [`PdfRasterizer::rasterize`] from async code. The page
    /// is JPEG-encoded as rendered, without the normaliser's size bound.
    pub fn rasterize_first_page(&self, bytes: &[u8]) -> Result<Base64Payload, TranslateError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;
        let document = load(&pdfium, bytes)?;

        let pages = document.pages();
        let total = pages.len();
        if total == 0 {
            return Err(TranslateError::RenderError {
                detail: "document has no pages".into(),
            });
        }
        info!("PDF loaded: {} pages, rendering page 1", total);

        let page = pages.get(0).map_err(|e| TranslateError::RenderError {
            detail: format!("could not open page 1: {e}"),
        })?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| TranslateError::RenderError {
                detail: format!("could not render page 1: {e}"),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page 1 at {:.2}x → {}x{} px",
            self.scale,
            image.width(),
            image.height()
        );

        self.normalizer.encode_surface(&image)
    }

    /// [`PdfRasterizer::rasterize_first_page`] on the blocking pool.
    pub async fn rasterize(&self, bytes: Arc<[u8]>) -> Result<Base64Payload, TranslateError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.rasterize_first_page(&bytes))
            .await
            .map_err(|e| TranslateError::Internal(format!("Render task panicked: {}", e)))?
    }

    /// Number of pages in `bytes`. Blocking.
    pub fn page_count(&self, bytes: &[u8]) -> Result<usize, TranslateError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;
        let document = load(&pdfium, bytes)?;
        Ok(document.pages().len() as usize)
    }
}

fn load<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>, TranslateError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| TranslateError::RenderError {
            detail: format!("could not parse PDF: {e}"),
        })
}
