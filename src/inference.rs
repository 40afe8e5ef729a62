//! Remote inference client for an Ollama-compatible server.
//!
//! Two calls share one endpoint, `POST {base}/api/generate`:
//!
//! * OCR: `{model, prompt, images: [<base64>], stream: false}`
//! * translation: `{model, prompt, stream: false}` (no `images` key)
//!
//! The answer is read from the `response` field of the JSON body. Liveness is
//! `GET {base}/api/tags`; any 2xx counts as healthy.
//!
//! Failures of any kind (transport error, non-2xx status, a body that is not
//! the expected JSON) surface as [`TranslateError::InferenceUnavailable`].
//! There is no retry, no backoff and no streaming.

use crate::config::TranslatorConfig;
use crate::document::Base64Payload;
use crate::error::TranslateError;
use crate::prompts::translation_prompt;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The subset of [`TranslatorConfig`] the client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub base_url: String,
    pub model: String,
    pub ocr_prompt: String,
    pub translation_prompt: String,
    pub request_timeout: Option<Duration>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::from(&TranslatorConfig::default())
    }
}

impl From<&TranslatorConfig> for InferenceConfig {
    fn from(c: &TranslatorConfig) -> Self {
        Self {
            base_url: c.base_url.clone(),
            model: c.model.clone(),
            ocr_prompt: c.ocr_prompt.clone(),
            translation_prompt: c.translation_prompt.clone(),
            request_timeout: c.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<[&'a str; 1]>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for the inference server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    config: InferenceConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self, TranslateError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TranslateError::Internal(format!("HTTP client init failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_config(config: &TranslatorConfig) -> Result<Self, TranslateError> {
        Self::new(InferenceConfig::from(config))
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }

    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url)
    }

    /// OCR: ask the model for the text in `image`.
    pub async fn extract_text(&self, image: &Base64Payload) -> Result<String, TranslateError> {
        debug!(
            "OCR request: {:?} payload, {} bytes base64",
            image.kind(),
            image.len()
        );
        self.generate(&self.config.ocr_prompt, Some(image.as_str()))
            .await
    }

    /// Translate `text` from `source_name` (or `auto-detect`) to `target_name`.
    ///
    /// Both names are display names, not codes.
    pub async fn translate(
        &self,
        text: &str,
        source_name: &str,
        target_name: &str,
    ) -> Result<String, TranslateError> {
        debug!(
            "Translation request: {} → {}, {} chars",
            source_name,
            target_name,
            text.chars().count()
        );
        let prompt = translation_prompt(
            &self.config.translation_prompt,
            source_name,
            target_name,
            text,
        );
        self.generate(&prompt, None).await
    }

    /// Liveness probe. `Ok(())` on any 2xx from `/api/tags`.
    pub async fn probe(&self) -> Result<(), TranslateError> {
        let url = self.tags_url();
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TranslateError::inference(self.base_url(), e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TranslateError::inference(
                self.base_url(),
                format!("HTTP {} from {}", status.as_u16(), url),
            ));
        }
        Ok(())
    }

    async fn generate(&self, prompt: &str, image: Option<&str>) -> Result<String, TranslateError> {
        let start = Instant::now();
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            images: image.map(|i| [i]),
            stream: false,
        };

        let resp = self
            .http
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslateError::inference(self.base_url(), e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let detail = detail.trim();
            return Err(TranslateError::inference(
                self.base_url(),
                if detail.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    format!("HTTP {}: {}", status.as_u16(), truncate(detail, 200))
                },
            ));
        }

        let raw = resp
            .bytes()
            .await
            .map_err(|e| TranslateError::inference(self.base_url(), e.to_string()))?;
        let parsed: GenerateResponse = serde_json::from_slice(&raw).map_err(|e| {
            TranslateError::inference(self.base_url(), format!("malformed response: {e}"))
        })?;

        info!(
            "Model '{}' answered in {}ms ({} chars)",
            self.config.model,
            start.elapsed().as_millis(),
            parsed.response.chars().count()
        );
        Ok(parsed.response)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
