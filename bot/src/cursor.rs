//! Persistence for the last-published watermark.
//!
//! The cursor is the only state that survives restarts: a single
//! second-precision timestamp stored as one line of text. Everything at or
//! before the cursor is considered already published.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use thiserror::Error;

/// On-disk and wire timestamp format shared with the vote source.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur reading or writing the cursor file.
#[derive(Debug, Error)]
pub enum CursorError {
    /// Cursor file could not be read or written
    #[error("cursor file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Cursor file exists but does not hold a valid timestamp
    #[error("cursor file holds an unparseable timestamp: {raw:?}")]
    Parse { raw: String },
}

/// File-backed store for the publication watermark.
///
/// The watermark is monotone non-decreasing; callers only write it after a
/// vote's whole thread has been confirmed posted.
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the watermark.
    ///
    /// A missing file means this is the first run; it resolves to "now" so
    /// the bot does not flood the feed with historical votes.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or holds invalid text.
    pub fn load(&self) -> Result<NaiveDateTime, CursorError> {
        if !self.path.exists() {
            let now = Local::now().naive_local();
            return Ok(now.with_nanosecond(0).unwrap_or(now));
        }

        let raw = fs::read_to_string(&self.path)?;
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map_err(|_| CursorError::Parse { raw: raw.to_string() })
    }

    /// Write the watermark, creating parent directories on first use.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, timestamp: NaiveDateTime) -> Result<(), CursorError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, timestamp.format(TIMESTAMP_FORMAT).to_string())?;
        Ok(())
    }
}
