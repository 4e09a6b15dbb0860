//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose note store use-cases to Dart via FRB as sync calls.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens the configured database, so each mutation is durable
//!   once the call returns `ok = true`.
//! - Envelopes never carry partial success as `ok = true`.
//!
//! # Change notification
//! Each call builds a fresh `NoteService` with no observers registered, so
//! no change events cross the FFI boundary. Hosts re-poll `notes_list` after
//! a mutating call returns `ok = true`.

use hayai_core::config::DEFAULT_DB_FILE_NAME;
use hayai_core::db::open_db;
use hayai_core::{
    core_version as core_version_inner, init_logging_from_config, ping as ping_inner, Note,
    NoteId, NotePatch, NoteService, NoteServiceError, NoteSummary, SqliteNoteRepository,
    StoreConfig,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

static STORE_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    // Reads the configured path without fixing it; configure_store may still run later.
    let db_path = STORE_DB_PATH
        .get()
        .cloned()
        .unwrap_or_else(default_store_db_path);
    let config = StoreConfig::new(db_path)
        .with_log_level(level.trim())
        .with_log_dir(log_dir.trim());
    match init_logging_from_config(&config) {
        Ok(_) => String::new(),
        Err(err) => err,
    }
}

/// Points the note store at the app's database file.
///
/// # FFI contract
/// - `db_path` must be absolute.
/// - Must run before the first note call; the path is fixed afterwards.
/// - Repeating the call with the same path is idempotent.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_store(db_path: String) -> String {
    let config = StoreConfig::new(db_path.trim());
    if let Err(err) = config.validate() {
        return err;
    }

    let active = STORE_DB_PATH.get_or_init(|| config.db_path.clone());
    if *active != config.db_path {
        return format!(
            "store already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            config.db_path.display()
        );
    }

    match open_db(active) {
        Ok(_) => String::new(),
        Err(err) => format!("configure_store failed: {err}"),
    }
}

/// Flat note projection returned to Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    /// Stable note ID in string form.
    pub id: String,
    pub title: String,
    pub content: String,
    /// One-line content preview for list cards.
    pub preview_line: Option<String>,
    /// Creation instant in epoch milliseconds.
    pub date_created: i64,
}

impl From<Note> for NoteItem {
    fn from(note: Note) -> Self {
        let summary = NoteSummary::from(&note);
        Self {
            id: note.id.to_string(),
            title: note.title,
            content: note.content,
            preview_line: summary.preview_line,
            date_created: note.date_created,
        }
    }
}

/// Envelope for list calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResponse {
    pub ok: bool,
    /// Notes in insertion order (empty on failure).
    pub items: Vec<NoteItem>,
    /// Human-readable status; "No notes yet." for an empty store.
    pub message: String,
}

/// Envelope for single-note calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteResponse {
    pub ok: bool,
    pub note: Option<NoteItem>,
    /// `validation|not_found|storage_failure|invalid_id`.
    pub error_code: Option<String>,
    pub message: String,
}

impl NoteResponse {
    fn success(message: impl Into<String>, note: Note) -> Self {
        Self {
            ok: true,
            note: Some(note.into()),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note: None,
            error_code: Some(error_code.to_string()),
            message: message.into(),
        }
    }
}

/// Envelope for bulk delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesDeleteResponse {
    pub ok: bool,
    pub deleted_ids: Vec<String>,
    /// Unknown or unparseable IDs; they never block the valid ones.
    pub missing_ids: Vec<String>,
    pub message: String,
}

/// Envelope for share/export text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTextResponse {
    pub ok: bool,
    pub text: Option<String>,
    pub message: String,
}

/// Lists all notes.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> NotesListResponse {
    match with_note_service(|service| service.list_notes().map_err(into_call_error)) {
        Ok(notes) => {
            let message = if notes.is_empty() {
                "No notes yet.".to_string()
            } else {
                format!("{} note(s).", notes.len())
            };
            NotesListResponse {
                ok: true,
                items: notes.into_iter().map(NoteItem::from).collect(),
                message,
            }
        }
        Err(err) => NotesListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("notes_list failed: {}", err.message),
        },
    }
}

/// Gets one note by ID.
#[flutter_rust_bridge::frb(sync)]
pub fn note_get(id: String) -> NoteResponse {
    let note_id = match parse_note_id(&id) {
        Ok(note_id) => note_id,
        Err(err) => return NoteResponse::failure(err.code, err.message),
    };
    let result = with_note_service(|service| {
        service
            .get_note(note_id)
            .map_err(into_call_error)?
            .ok_or_else(|| into_call_error(NoteServiceError::NotFound(note_id)))
    });
    match result {
        Ok(note) => NoteResponse::success("Note loaded.", note),
        Err(err) => NoteResponse::failure(err.code, format!("note_get failed: {}", err.message)),
    }
}

/// Creates a note from the new-note form.
///
/// # FFI contract
/// - Both `title` and `content` must be non-empty; rejected otherwise with
///   `error_code = "validation"`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn note_create(title: String, content: String) -> NoteResponse {
    match with_note_service(|service| {
        service
            .create_note(title, content)
            .map_err(into_call_error)
    }) {
        Ok(note) => NoteResponse::success("Note created.", note),
        Err(err) => {
            NoteResponse::failure(err.code, format!("note_create failed: {}", err.message))
        }
    }
}

/// Updates title and/or content of an existing note.
///
/// `None` leaves the field unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(id: String, title: Option<String>, content: Option<String>) -> NoteResponse {
    let note_id = match parse_note_id(&id) {
        Ok(note_id) => note_id,
        Err(err) => return NoteResponse::failure(err.code, err.message),
    };
    let patch = NotePatch { title, content };
    match with_note_service(|service| {
        service
            .update_note(note_id, patch)
            .map_err(into_call_error)
    }) {
        Ok(note) => NoteResponse::success("Note updated.", note),
        Err(err) => {
            NoteResponse::failure(err.code, format!("note_update failed: {}", err.message))
        }
    }
}

/// Permanently deletes one note.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: String) -> NoteResponse {
    let note_id = match parse_note_id(&id) {
        Ok(note_id) => note_id,
        Err(err) => return NoteResponse::failure(err.code, err.message),
    };
    match with_note_service(|service| service.delete_note(note_id).map_err(into_call_error)) {
        Ok(()) => NoteResponse {
            ok: true,
            note: None,
            error_code: None,
            message: "Note deleted.".to_string(),
        },
        Err(err) => {
            NoteResponse::failure(err.code, format!("note_delete failed: {}", err.message))
        }
    }
}

/// Deletes several notes in one transaction (swipe-to-delete).
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(ids: Vec<String>) -> NotesDeleteResponse {
    let mut missing_ids = Vec::new();
    let mut note_ids = Vec::with_capacity(ids.len());
    for raw in ids {
        match parse_note_id(&raw) {
            Ok(note_id) => note_ids.push(note_id),
            Err(_) => missing_ids.push(raw),
        }
    }

    match with_note_service(|service| service.delete_notes(&note_ids).map_err(into_call_error)) {
        Ok(outcome) => {
            missing_ids.extend(outcome.missing.iter().map(ToString::to_string));
            let deleted_ids: Vec<String> =
                outcome.deleted.iter().map(ToString::to_string).collect();
            let message = format!(
                "Deleted {} note(s); {} missing.",
                deleted_ids.len(),
                missing_ids.len()
            );
            NotesDeleteResponse {
                ok: true,
                deleted_ids,
                missing_ids,
                message,
            }
        }
        Err(err) => NotesDeleteResponse {
            ok: false,
            deleted_ids: Vec::new(),
            missing_ids,
            message: format!("notes_delete failed: {}", err.message),
        },
    }
}

/// Renders `"<title>\n\n<content>"` for the share sheet.
#[flutter_rust_bridge::frb(sync)]
pub fn note_share_text(id: String) -> ShareTextResponse {
    let result = parse_note_id(&id).and_then(|note_id| {
        with_note_service(|service| service.share_text(note_id).map_err(into_call_error))
    });
    match result {
        Ok(text) => ShareTextResponse {
            ok: true,
            text: Some(text),
            message: "Share text ready.".to_string(),
        },
        Err(err) => ShareTextResponse {
            ok: false,
            text: None,
            message: format!("note_share_text failed: {}", err.message),
        },
    }
}

struct CallError {
    code: &'static str,
    message: String,
}

fn into_call_error(err: NoteServiceError) -> CallError {
    CallError {
        code: err.code(),
        message: err.to_string(),
    }
}

fn parse_note_id(raw: &str) -> Result<NoteId, CallError> {
    Uuid::parse_str(raw.trim()).map_err(|_| CallError {
        code: "invalid_id",
        message: format!("invalid note id `{}`", raw.trim()),
    })
}

fn default_store_db_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

fn resolve_store_db_path() -> PathBuf {
    STORE_DB_PATH.get_or_init(default_store_db_path).clone()
}

fn with_note_service<T>(
    f: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T, CallError>,
) -> Result<T, CallError> {
    let db_path = resolve_store_db_path();
    let mut conn = open_db(&db_path).map_err(|err| storage_call_error("db_open", err))?;
    let repo = SqliteNoteRepository::try_new(&mut conn)
        .map_err(|err| storage_call_error("repo_init", err))?;
    let mut service = NoteService::new(repo);
    f(&mut service)
}

fn storage_call_error(stage: &str, err: impl std::fmt::Display) -> CallError {
    warn!("event=ffi_store_open module=ffi status=error stage={stage} error={err}");
    CallError {
        code: "storage_failure",
        message: format!("note store unavailable: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_store, core_version, init_logging, note_create, note_delete, note_get,
        note_share_text, note_update, notes_delete, notes_list, ping,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), "  ".to_string());
        assert_eq!(error, "log_dir cannot be empty");
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let log_dir = std::env::temp_dir().join("hayai-ffi-logs");
        let error = init_logging("verbose".to_string(), log_dir.display().to_string());
        assert!(error.contains("unsupported log level"), "{error}");
    }

    #[test]
    fn configure_store_rejects_relative_path() {
        let error = configure_store("notes.sqlite3".to_string());
        assert!(error.contains("absolute"));
    }

    #[test]
    fn create_update_share_and_delete_roundtrip() {
        let token = unique_token("roundtrip");
        let created = note_create(token.clone(), "Milk, eggs, bread".to_string());
        assert!(created.ok, "{}", created.message);
        let id = created.note.expect("created note").id;

        let listed = notes_list();
        assert!(listed.ok, "{}", listed.message);
        assert!(listed.items.iter().any(|item| item.id == id));

        let updated = note_update(
            id.clone(),
            None,
            Some("Milk, eggs, bread, butter".to_string()),
        );
        assert!(updated.ok, "{}", updated.message);
        let note = updated.note.expect("updated note");
        assert_eq!(note.title, token);
        assert_eq!(note.content, "Milk, eggs, bread, butter");

        let shared = note_share_text(id.clone());
        assert_eq!(
            shared.text.as_deref(),
            Some(format!("{token}\n\nMilk, eggs, bread, butter").as_str())
        );

        assert!(note_delete(id.clone()).ok);
        let gone = note_get(id);
        assert!(!gone.ok);
        assert_eq!(gone.error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn note_create_rejects_empty_fields() {
        let response = note_create(String::new(), "body".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("validation"));
    }

    #[test]
    fn note_update_rejects_malformed_id() {
        let response = note_update("nope".to_string(), Some("t".to_string()), None);
        assert!(!response.ok);
        assert_eq!(response.error_code.as_deref(), Some("invalid_id"));
    }

    #[test]
    fn notes_delete_reports_missing_without_blocking_valid_ids() {
        let first = note_create(unique_token("bulk-a"), "a".to_string());
        let second = note_create(unique_token("bulk-b"), "b".to_string());
        let first_id = first.note.expect("first note").id;
        let second_id = second.note.expect("second note").id;

        let response = notes_delete(vec![
            first_id.clone(),
            "garbage".to_string(),
            second_id.clone(),
        ]);
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.deleted_ids, vec![first_id, second_id]);
        assert_eq!(response.missing_ids, vec!["garbage".to_string()]);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
