//! Configuration types for extraction and translation.
//!
//! All behaviour is controlled through [`TranslatorConfig`], built via its
//! [`TranslatorConfigBuilder`]. The inference endpoint, model identifier and
//! prompts live here rather than as literals in the client, so the same
//! pipeline can target any Ollama-compatible backend, local or remote.

use crate::error::TranslateError;
use crate::prompts::{DEFAULT_OCR_PROMPT, DEFAULT_TRANSLATION_PROMPT};
use std::fmt;
use std::path::PathBuf;

/// Default base URL of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default vision-capable model used for both OCR and translation.
pub const DEFAULT_MODEL: &str = "llama3.2-vision";

/// Configuration for a translation session.
///
/// Built via [`TranslatorConfig::builder()`] or using
/// [`TranslatorConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_translate::TranslatorConfig;
///
/// let config = TranslatorConfig::builder()
///     .base_url("http://gpu-box:11434")
///     .model("llava")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llava");
/// ```
#[derive(Clone)]
pub struct TranslatorConfig {
    /// Base URL of the inference server. Default: `http://localhost:11434`.
    ///
    /// Requests go to `{base_url}/api/generate`; liveness probes to
    /// `{base_url}/api/tags`. Stored without a trailing slash.
    pub base_url: String,

    /// Model identifier sent with every request. Default: `llama3.2-vision`.
    ///
    /// OCR requests carry an image, so the model must be vision-capable.
    pub model: String,

    /// Instruction sent with OCR requests. Default: [`DEFAULT_OCR_PROMPT`].
    pub ocr_prompt: String,

    /// Translation prompt template. Default: [`DEFAULT_TRANSLATION_PROMPT`].
    ///
    /// `{source}`, `{target}` and `{text}` are substituted before sending.
    pub translation_prompt: String,

    /// Optional per-request timeout in seconds. Default: none.
    ///
    /// Without a timeout a hung server keeps the caller busy until the
    /// transport gives up on its own.
    pub request_timeout_secs: Option<u64>,

    /// Interval between liveness probes in seconds. Default: 30.
    pub health_interval_secs: u64,

    /// Longest allowed image edge before OCR, in pixels. Default: 1024.
    pub max_image_dimension: u32,

    /// JPEG quality (1–100) for every image sent to the model. Default: 80.
    pub jpeg_quality: u8,

    /// Scale factor applied to the PDF page viewport when rasterising. Default: 2.0.
    pub pdf_render_scale: f32,

    /// Explicit path to a pdfium shared library. Default: none (auto-detect).
    pub pdfium_library_path: Option<PathBuf>,

    /// Rescale and re-encode images before OCR. Default: true.
    ///
    /// When false the uploaded image bytes are sent to the model as-is.
    pub normalize_images: bool,

    /// Source language code used by new sessions. Default: `auto`.
    pub source_lang: String,

    /// Target language code used by new sessions. Default: `tr`.
    pub target_lang: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ocr_prompt: DEFAULT_OCR_PROMPT.to_string(),
            translation_prompt: DEFAULT_TRANSLATION_PROMPT.to_string(),
            request_timeout_secs: None,
            health_interval_secs: 30,
            max_image_dimension: 1024,
            jpeg_quality: 80,
            pdf_render_scale: 2.0,
            pdfium_library_path: None,
            normalize_images: true,
            source_lang: "auto".to_string(),
            target_lang: "tr".to_string(),
        }
    }
}

impl fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("ocr_prompt", &format!("<{} chars>", self.ocr_prompt.len()))
            .field(
                "translation_prompt",
                &format!("<{} chars>", self.translation_prompt.len()),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("health_interval_secs", &self.health_interval_secs)
            .field("max_image_dimension", &self.max_image_dimension)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("pdf_render_scale", &self.pdf_render_scale)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("normalize_images", &self.normalize_images)
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .finish()
    }
}

impl TranslatorConfig {
    /// Create a new builder for `TranslatorConfig`.
    pub fn builder() -> TranslatorConfigBuilder {
        TranslatorConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the generation endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Full URL of the liveness endpoint.
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }
}

/// Builder for [`TranslatorConfig`].
#[derive(Debug)]
pub struct TranslatorConfigBuilder {
    config: TranslatorConfig,
}

impl TranslatorConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn ocr_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.ocr_prompt = prompt.into();
        self
    }

    pub fn translation_prompt(mut self, template: impl Into<String>) -> Self {
        self.config.translation_prompt = template.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn health_interval_secs(mut self, secs: u64) -> Self {
        self.config.health_interval_secs = secs.max(1);
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(16);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    /// Set JPEG quality on the 0–1 scale used by browser canvases (0.8 → 80).
    pub fn jpeg_quality_factor(self, q: f32) -> Self {
        let q = (q.clamp(0.0, 1.0) * 100.0).round() as u8;
        self.jpeg_quality(q)
    }

    pub fn pdf_render_scale(mut self, scale: f32) -> Self {
        self.config.pdf_render_scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn normalize_images(mut self, v: bool) -> Self {
        self.config.normalize_images = v;
        self
    }

    pub fn source_lang(mut self, code: impl Into<String>) -> Self {
        self.config.source_lang = code.into();
        self
    }

    pub fn target_lang(mut self, code: impl Into<String>) -> Self {
        self.config.target_lang = code.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslatorConfig, TranslateError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(TranslateError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(TranslateError::InvalidConfig(
                "model identifier must not be empty".into(),
            ));
        }
        if !c.translation_prompt.contains("{text}") {
            return Err(TranslateError::InvalidConfig(
                "translation prompt must contain a {text} placeholder".into(),
            ));
        }
        if c.target_lang.trim().is_empty() || c.target_lang == "auto" {
            return Err(TranslateError::InvalidConfig(format!(
                "target language must be a concrete language code, got '{}'",
                c.target_lang
            )));
        }
        Ok(self.config)
    }
}
