//! Session context: the state a user works with between uploads.
//!
//! [`TranslationSession`] owns everything one user session needs: the
//! inference client, the document dispatcher, the image and PDF encoders,
//! the health monitor task, and a [`SessionState`] with the source and
//! translated text buffers.
//!
//! ## Overlapping operations
//!
//! Operations are not serialised. Two uploads in flight at once both run to
//! completion and whichever resolves last overwrites the buffer. `busy` is a
//! single flag, so the first operation to finish clears it while the other
//! may still be running. Callers that need stricter behaviour should await
//! one operation before starting the next.

use crate::config::TranslatorConfig;
use crate::document::{Base64Payload, PayloadKind, UploadedFile};
use crate::download::{artifact_stem, save_text};
use crate::error::TranslateError;
use crate::health::{ConnectionState, HealthMonitor};
use crate::inference::InferenceClient;
use crate::languages::{self, AUTO};
use crate::pipeline::dispatch::DocumentDispatcher;
use crate::pipeline::encode::ImageNormalizer;
use crate::pipeline::render::PdfRasterizer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

/// Buffers and selections of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub source_text: String,
    pub translated_text: String,
    /// `auto` or a language code.
    pub source_lang: String,
    pub target_lang: String,
    pub busy: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            source_text: String::new(),
            translated_text: String::new(),
            source_lang: AUTO.to_string(),
            target_lang: "tr".to_string(),
            busy: false,
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sets `busy` on creation and clears it on drop.
struct BusyGuard {
    state: Arc<Mutex<SessionState>>,
}

impl BusyGuard {
    fn new(state: &Arc<Mutex<SessionState>>) -> Self {
        lock(state).busy = true;
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        lock(&self.state).busy = false;
    }
}

/// One user session against an inference server.
pub struct TranslationSession {
    config: TranslatorConfig,
    client: InferenceClient,
    dispatcher: DocumentDispatcher,
    normalizer: ImageNormalizer,
    rasterizer: PdfRasterizer,
    state: Arc<Mutex<SessionState>>,
    monitor: Mutex<Option<HealthMonitor>>,
}

impl std::fmt::Debug for TranslationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationSession")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("dispatcher", &self.dispatcher)
            .field("state", &*lock(&self.state))
            .finish()
    }
}

impl TranslationSession {
    /// Build the pipeline and start the health monitor.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(config: TranslatorConfig) -> Result<Self, TranslateError> {
        let client = InferenceClient::from_config(&config)?;
        let monitor = HealthMonitor::spawn(
            client.clone(),
            Duration::from_secs(config.health_interval_secs.max(1)),
        );
        let state = SessionState {
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            ..SessionState::default()
        };

        info!(
            "Session started: {} (model {})",
            config.base_url, config.model
        );

        Ok(Self {
            normalizer: ImageNormalizer::from_config(&config),
            rasterizer: PdfRasterizer::from_config(&config),
            dispatcher: DocumentDispatcher::default(),
            client,
            config,
            state: Arc::new(Mutex::new(state)),
            monitor: Mutex::new(Some(monitor)),
        })
    }

    /// Replace the document dispatcher, e.g. to register a real parser.
    pub fn with_dispatcher(mut self, dispatcher: DocumentDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Stop the health monitor. Other operations keep working.
    pub async fn shutdown(&self) {
        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(monitor) = monitor {
            monitor.shutdown().await;
            debug!("Session health monitor shut down");
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    pub fn dispatcher(&self) -> &DocumentDispatcher {
        &self.dispatcher
    }

    /// OCR an image or the first page of a PDF into the source buffer.
    ///
    /// Other types fail with [`TranslateError::UnsupportedFormat`] before any
    /// request is made.
    pub async fn ocr_file(&self, file: &UploadedFile) -> Result<String, TranslateError> {
        let _busy = BusyGuard::new(&self.state);
        let declared = file.declared();

        let payload = if declared.is_image() {
            if self.config.normalize_images {
                let bytes = file.shared_bytes();
                let normalizer = self.normalizer;
                tokio::task::spawn_blocking(move || normalizer.normalize(&bytes))
                    .await
                    .map_err(|e| TranslateError::Internal(format!("Encode task panicked: {}", e)))??
            } else {
                Base64Payload::from_bytes(file.bytes(), PayloadKind::Image)
            }
        } else if declared.is_pdf() {
            self.rasterizer.rasterize(file.shared_bytes()).await?
        } else {
            return Err(TranslateError::UnsupportedFormat {
                media_type: declared.media_type.clone(),
                filename: declared.filename.clone(),
            });
        };

        debug!("OCR '{}' ({})", file.filename(), file.media_type());
        let text = self.client.extract_text(&payload).await?;
        lock(&self.state).source_text = text.clone();
        Ok(text)
    }

    /// Extract text heuristically from a document into the source buffer.
    pub async fn load_document(&self, file: &UploadedFile) -> Result<String, TranslateError> {
        let _busy = BusyGuard::new(&self.state);
        let dispatcher = self.dispatcher.clone();
        let file = file.clone();
        let text = tokio::task::spawn_blocking(move || dispatcher.extract(&file))
            .await
            .map_err(|e| TranslateError::Internal(format!("Extract task panicked: {}", e)))??;
        lock(&self.state).source_text = text.clone();
        Ok(text)
    }

    /// Translate the source buffer into the translated buffer.
    pub async fn translate(&self) -> Result<String, TranslateError> {
        let (text, source, target) = {
            let s = lock(&self.state);
            (s.source_text.clone(), s.source_lang.clone(), s.target_lang.clone())
        };
        if text.trim().is_empty() {
            return Err(TranslateError::EmptySourceText);
        }

        let _busy = BusyGuard::new(&self.state);
        let translated = self
            .client
            .translate(
                &text,
                languages::source_name(&source),
                languages::target_name(&target),
            )
            .await?;
        lock(&self.state).translated_text = translated.clone();
        Ok(translated)
    }

    pub fn set_source_text(&self, text: impl Into<String>) {
        lock(&self.state).source_text = text.into();
    }

    /// Select languages. The target must be a concrete language, not `auto`.
    pub fn set_languages(
        &self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), TranslateError> {
        let (source, target) = (source.into(), target.into());
        if target.trim().is_empty() || target.eq_ignore_ascii_case(AUTO) {
            return Err(TranslateError::InvalidConfig(format!(
                "target language must be a concrete language code, got '{target}'"
            )));
        }
        let mut s = lock(&self.state);
        s.source_lang = source;
        s.target_lang = target;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }

    /// Save the translated buffer as a timestamped `.txt` in `dir`.
    pub fn save_translation(&self, dir: &Path) -> Result<PathBuf, TranslateError> {
        let s = self.snapshot();
        let stem = artifact_stem(&s.source_lang, &s.target_lang, chrono::Utc::now());
        save_text(dir, &stem, &s.translated_text)
    }

    /// Last state published by the health monitor.
    pub fn connection_state(&self) -> ConnectionState {
        self.monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(HealthMonitor::state)
            .unwrap_or_default()
    }

    /// Stream of connection states, or `None` after [`TranslationSession::shutdown`].
    pub fn connection_updates(&self) -> Option<WatchStream<ConnectionState>> {
        self.monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(HealthMonitor::updates)
    }

    /// Result of the monitor's first completed probe.
    ///
    /// Waits for the startup probe instead of sending another request. After
    /// shutdown this probes directly.
    pub async fn settled_connection_state(&self) -> ConnectionState {
        let rx = self
            .monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(HealthMonitor::subscribe);
        match rx {
            Some(mut rx) => {
                let settled = rx
                    .wait_for(|s| *s != ConnectionState::Unknown)
                    .await
                    .map(|state| *state);
                settled.unwrap_or_default()
            }
            None => self.recheck_connection().await,
        }
    }

    /// Probe the server now.
    ///
    /// Publishes through the monitor while it runs; after shutdown the probe
    /// result is only returned.
    pub async fn recheck_connection(&self) -> ConnectionState {
        let probe = self
            .monitor
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(HealthMonitor::probe_handle);
        match probe {
            Some(probe) => probe.recheck().await,
            None => match self.client.probe().await {
                Ok(()) => ConnectionState::Connected,
                Err(_) => ConnectionState::Disconnected,
            },
        }
    }
}
