//! Input and payload types: the uploaded file and the base64 payload sent
//! to the model.
//!
//! An [`UploadedFile`] is immutable once created. Its bytes sit behind an
//! `Arc<[u8]>`, so handing it to a blocking task or a second consumer never
//! copies or mutates the buffer.

use crate::error::TranslateError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Media type used when the extension is not recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Declared media type and filename of an upload, as reported by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub media_type: String,
    pub filename: String,
}

impl DeclaredType {
    pub fn new(media_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    /// Case-insensitive filename suffix check (`ext` without the dot).
    pub fn has_extension(&self, ext: &str) -> bool {
        extension_of(&self.filename).is_some_and(|e| e.eq_ignore_ascii_case(ext))
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == "application/pdf"
    }
}

/// A file submitted by the user: bytes plus what the caller claims it is.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    bytes: Arc<[u8]>,
    declared: DeclaredType,
}

impl UploadedFile {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            declared: DeclaredType::new(media_type, filename),
        }
    }

    /// Read a local file, declaring its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TranslateError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TranslateError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => TranslateError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => TranslateError::DecodeError {
                detail: format!("failed to read '{}': {}", path.display(), e),
            },
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type_for(&filename);
        debug!(
            "Loaded {} ({} bytes, declared {})",
            path.display(),
            bytes.len(),
            media_type
        );

        Ok(Self::new(bytes, media_type, filename))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap shared handle to the bytes, for moving into a blocking task.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn declared(&self) -> &DeclaredType {
        &self.declared
    }

    pub fn media_type(&self) -> &str {
        &self.declared.media_type
    }

    pub fn filename(&self) -> &str {
        &self.declared.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Logical kind of a [`Base64Payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PayloadKind {
    /// A (re-)encoded JPEG image.
    Image,
    /// Raw PDF bytes.
    Pdf,
    /// Raw document bytes.
    RawText,
}

/// Base64-encoded bytes for one inference request, without any data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Payload {
    data: String,
    kind: PayloadKind,
}

impl Base64Payload {
    /// Encode raw bytes as-is.
    pub fn from_bytes(bytes: &[u8], kind: PayloadKind) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            kind,
        }
    }

    /// Wrap an already-encoded JPEG.
    pub(crate) fn jpeg(jpeg_bytes: &[u8]) -> Self {
        Self::from_bytes(jpeg_bytes, PayloadKind::Image)
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode back to bytes.
    pub fn decode(&self) -> Result<Vec<u8>, TranslateError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| TranslateError::DecodeError {
                detail: format!("invalid base64 payload: {e}"),
            })
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

/// Lower-case extension of a filename, without the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Media type for the file types the pipeline accepts.
pub fn media_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => OCTET_STREAM,
    }
}
