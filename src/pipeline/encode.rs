//! Image normalisation: decode, bound the longest edge, JPEG-encode, base64.
//!
//! Every image that reaches the model goes through [`ImageNormalizer`]:
//! uploaded photos and scans via [`ImageNormalizer::normalize`], rendered
//! PDF pages via [`ImageNormalizer::encode_surface`]. Both end in the same
//! JPEG step so quality is identical regardless of origin.
//!
//! JPEG has no alpha channel, so surfaces are flattened to RGB first.

use crate::config::TranslatorConfig;
use crate::document::Base64Payload;
use crate::error::TranslateError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Rescales and re-encodes images before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    max_dimension: u32,
    jpeg_quality: u8,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(1024, 80)
    }
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32, jpeg_quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.max_image_dimension, config.jpeg_quality)
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Decode `bytes`, shrink to fit the bound, and encode as base64 JPEG.
    pub fn normalize(&self, bytes: &[u8]) -> Result<Base64Payload, TranslateError> {
        let img = image::load_from_memory(bytes).map_err(|e| TranslateError::DecodeError {
            detail: format!("not a decodable image: {e}"),
        })?;

        let (w, h) = (img.width(), img.height());
        let (tw, th) = fit_within(w, h, self.max_dimension);
        let img = if (tw, th) == (w, h) {
            img
        } else {
            debug!("Resizing {}x{} → {}x{}", w, h, tw, th);
            img.resize_exact(tw, th, FilterType::CatmullRom)
        };

        self.encode_surface(&img)
    }

    /// JPEG-encode a surface at the configured quality, without resizing.
    pub fn encode_surface(&self, img: &DynamicImage) -> Result<Base64Payload, TranslateError> {
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| TranslateError::EncodingUnavailable {
                detail: format!("JPEG encoder failed: {e}"),
            })?;

        let payload = Base64Payload::jpeg(&buf);
        debug!(
            "Encoded {}x{} surface → {} bytes JPEG, {} bytes base64",
            rgb.width(),
            rgb.height(),
            buf.len(),
            payload.len()
        );
        Ok(payload)
    }
}

/// Target size for a `w`×`h` image so neither side exceeds `max`.
///
/// The larger side becomes exactly `max`; the other is scaled by the same
/// ratio and rounded, never below 1. Images already inside the bound are
/// returned unchanged.
pub fn fit_within(w: u32, h: u32, max: u32) -> (u32, u32) {
    if w <= max && h <= max {
        return (w, h);
    }
    let scale = |side: u32, long: u32| -> u32 {
        ((side as f64 * max as f64 / long as f64).round() as u32).max(1)
    };
    if w >= h {
        (max, scale(h, w))
    } else {
        (scale(w, h), max)
    }
}
