//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD persistence over the `notes` table.
//! - Own bulk delete with single-transaction semantics.
//!
//! # Invariants
//! - Write paths validate before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - `uuid` and `date_created` are never written after insert.
//! - Listing order is `date_created ASC, rowid ASC` (insertion order).

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteValidationError};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    date_created
FROM notes";

const REQUIRED_NOTE_COLUMNS: [&str; 4] = ["uuid", "title", "content", "date_created"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial replacement of the mutable note fields.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NotePatch {
    /// Patch replacing both mutable fields.
    pub fn full(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
        }
    }

    /// Returns whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Writes the provided fields into `note`, leaving identity untouched.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            note.content.clone_from(content);
        }
    }

    /// Applies the create-time non-empty rule to each provided field.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.as_deref() == Some("") {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.content.as_deref() == Some("") {
            return Err(NoteValidationError::EmptyContent);
        }
        Ok(())
    }
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteManyOutcome {
    /// IDs removed by this call, in request order.
    pub deleted: Vec<NoteId>,
    /// IDs that did not reference an existing note.
    pub missing: Vec<NoteId>,
}

/// Repository interface for note CRUD operations.
pub trait NoteRepository {
    /// Inserts one note and returns its stable id.
    fn create_note(&self, note: &Note) -> RepoResult<NoteId>;
    /// Replaces the provided fields of one note in place.
    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes in insertion order.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Hard-deletes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Hard-deletes a set of notes in one transaction, skipping unknown ids.
    fn delete_notes(&mut self, ids: &[NoteId]) -> RepoResult<DeleteManyOutcome>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema is
    ///   not the one this binary expects.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;

        self.conn.execute(
            "INSERT INTO notes (
                uuid,
                title,
                content,
                date_created
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                note.id.to_string(),
                note.title.as_str(),
                note.content.as_str(),
                note.date_created,
            ],
        )?;

        Ok(note.id)
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        patch.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                patch.title.as_deref(),
                patch.content.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} ORDER BY date_created ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_notes(&mut self, ids: &[NoteId]) -> RepoResult<DeleteManyOutcome> {
        let mut outcome = DeleteManyOutcome::default();
        if ids.is_empty() {
            return Ok(outcome);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut seen = BTreeSet::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }

            let changed = tx.execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;
            if changed == 0 {
                outcome.missing.push(*id);
            } else {
                outcome.deleted.push(*id);
            }
        }
        tx.commit()?;

        Ok(outcome)
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;

    Note::with_id(
        id,
        row.get::<_, String>("title")?,
        row.get::<_, String>("content")?,
        row.get::<_, i64>("date_created")?,
    )
    .map_err(|err| RepoError::InvalidData(format!("note {uuid_text}: {err}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 =
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in REQUIRED_NOTE_COLUMNS {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::NotePatch;
    use crate::model::note::NoteValidationError;

    #[test]
    fn empty_patch_is_detected() {
        assert!(NotePatch::default().is_empty());
        assert!(!NotePatch::full("a", "b").is_empty());
    }

    #[test]
    fn patch_validation_only_checks_provided_fields() {
        let content_only = NotePatch {
            title: None,
            content: Some("body".to_string()),
        };
        assert!(content_only.validate().is_ok());

        let blank_title = NotePatch {
            title: Some(String::new()),
            content: None,
        };
        assert_eq!(
            blank_title.validate(),
            Err(NoteValidationError::EmptyTitle)
        );
    }
}
