//! Note domain model.
//!
//! # Responsibility
//! - Define the single persisted record type (`Note`).
//! - Provide construction and validation helpers for write paths.
//! - Render the read-only share/export text.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `date_created` is assigned once at construction and never changes.
//! - `title` and `content` must both be non-empty to be persisted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Validation failures for note write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValidationError {
    /// `title` is the empty string.
    EmptyTitle,
    /// `content` is the empty string.
    EmptyContent,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be empty"),
            Self::EmptyContent => write!(f, "note content must not be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// A single persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable ID assigned at creation.
    pub id: NoteId,
    /// Free-text title.
    pub title: String,
    /// Free-text body.
    pub content: String,
    /// Creation instant in Unix epoch milliseconds (UTC).
    pub date_created: i64,
}

impl Note {
    /// Creates a validated note with a fresh ID, stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, NoteValidationError> {
        Self::with_id(
            Uuid::new_v4(),
            title,
            content,
            Utc::now().timestamp_millis(),
        )
    }

    /// Creates a validated note with caller-provided identity and timestamp.
    ///
    /// Used by storage read paths and tests that need fixed values.
    pub fn with_id(
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
        date_created: i64,
    ) -> Result<Self, NoteValidationError> {
        let note = Self {
            id,
            title: title.into(),
            content: content.into(),
            date_created,
        };
        note.validate()?;
        Ok(note)
    }

    /// Checks the non-empty title/content rule.
    ///
    /// Only the empty string is rejected; whitespace-only text is accepted.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        validate_fields(self.title.as_str(), self.content.as_str())
    }

    /// Returns the creation instant as a UTC datetime.
    ///
    /// Returns `None` when the stored millisecond value is out of range.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.date_created).single()
    }

    /// Formats the note for share/export as `"<title>\n\n<content>"`.
    pub fn share_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.content)
    }
}

/// Validates a title/content pair before it reaches storage.
pub fn validate_fields(title: &str, content: &str) -> Result<(), NoteValidationError> {
    if title.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    if content.is_empty() {
        return Err(NoteValidationError::EmptyContent);
    }
    Ok(())
}
