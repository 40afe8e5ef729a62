//! The downloadable translation artifact.
//!
//! File name: `translation_{src}_to_{tgt}_{timestamp}.txt`, where the
//! timestamp is UTC ISO-8601 truncated to seconds with `:` replaced by `-`
//! (e.g. `2024-03-09T14-05-59`). Contents are the translated text as UTF-8,
//! byte for byte: no BOM, no added trailing newline.

use crate::error::TranslateError;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// `translation_{src}_to_{tgt}_{YYYY-MM-DDTHH-MM-SS}`.
pub fn artifact_stem(source_lang: &str, target_lang: &str, at: DateTime<Utc>) -> String {
    format!(
        "translation_{}_to_{}_{}",
        source_lang,
        target_lang,
        at.format("%Y-%m-%dT%H-%M-%S")
    )
}

/// [`artifact_stem`] plus `.txt`.
pub fn artifact_filename(source_lang: &str, target_lang: &str, at: DateTime<Utc>) -> String {
    format!("{}.txt", artifact_stem(source_lang, target_lang, at))
}

/// Write `text` to `dir/{stem}.txt` atomically and return the final path.
///
/// The bytes go to a temporary file in `dir` first and are renamed into
/// place, so a failed write never leaves a partial artifact behind.
pub fn save_text(dir: &Path, stem: &str, text: &str) -> Result<PathBuf, TranslateError> {
    let path = dir.join(format!("{stem}.txt"));
    let write_err = |source: std::io::Error| TranslateError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    info!("Saved translation → {} ({} bytes)", path.display(), text.len());
    Ok(path)
}
