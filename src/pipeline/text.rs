//! Plain-text extraction: the bytes are the text.

use crate::document::DeclaredType;
use crate::error::TranslateError;
use crate::pipeline::dispatch::TextExtractor;

/// Accepts `text/plain` and decodes it as UTF-8.
///
/// Invalid sequences become U+FFFD; valid UTF-8 comes back byte-for-byte,
/// including a leading byte-order mark.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn accepts(&self, declared: &DeclaredType) -> bool {
        declared.media_type == "text/plain"
    }

    fn try_extract(&self, bytes: &[u8], _declared: &DeclaredType) -> Result<String, TranslateError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
