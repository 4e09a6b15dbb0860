//! Note store use-case service.
//!
//! # Responsibility
//! - Provide list/create/update/delete/bulk-delete APIs over a repository.
//! - Validate user input before it reaches storage.
//! - Notify observers once per committed logical operation.
//! - Derive one-line previews for list rendering.
//!
//! # Invariants
//! - The service is the only writer of the note collection.
//! - Create/update return the note exactly as committed; no read-back runs
//!   after the write, so a committed write is never reported as a failure.
//! - Note titles/content are never written to logs.

use crate::model::note::{validate_fields, Note, NoteId, NoteValidationError};
use crate::repo::note_repo::{DeleteManyOutcome, NotePatch, NoteRepository, RepoError};
use crate::service::notify::{NoteChange, NoteObserver, ObserverList};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const PREVIEW_MAX_CHARS: usize = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note store use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Empty title or content.
    Validation(NoteValidationError),
    /// Target note does not exist.
    NotFound(NoteId),
    /// The backing store could not complete the read/write.
    Storage(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Storage(err) => write!(f, "note storage failure: {err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl NoteServiceError {
    /// Stable short code for logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_failure",
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// List-card projection of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    /// First non-blank content line, whitespace collapsed.
    pub preview_line: Option<String>,
    pub date_created: i64,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            preview_line: derive_preview_line(note.content.as_str()),
            date_created: note.date_created,
        }
    }
}

/// Note store facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    observers: ObserverList,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            observers: ObserverList::default(),
        }
    }

    /// Registers an observer notified after every committed mutation.
    pub fn subscribe(&mut self, observer: impl NoteObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Lists all notes in insertion order.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes()?)
    }

    /// Lists list-card projections in the same order as [`Self::list_notes`].
    pub fn list_summaries(&self) -> NoteServiceResult<Vec<NoteSummary>> {
        let notes = self.repo.list_notes()?;
        Ok(notes.iter().map(NoteSummary::from).collect())
    }

    /// Gets one note by stable ID.
    pub fn get_note(&self, id: NoteId) -> NoteServiceResult<Option<Note>> {
        Ok(self.repo.get_note(id)?)
    }

    /// Creates one note.
    ///
    /// # Errors
    /// - `Validation` when `title` or `content` is empty; nothing is stored.
    /// - `Storage` when the insert cannot be committed.
    pub fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        let note = match Note::new(title, content) {
            Ok(note) => note,
            Err(err) => {
                warn!("event=note_create module=note_service status=rejected reason={err}");
                return Err(err.into());
            }
        };

        let id = self
            .repo
            .create_note(&note)
            .map_err(|err| log_failure("note_create", err.into()))?;

        info!(
            "event=note_create module=note_service status=ok note_id={} created_at={} duration_ms={}",
            id,
            note.created_at()
                .map_or_else(|| note.date_created.to_string(), |at| at.to_rfc3339()),
            started_at.elapsed().as_millis()
        );
        self.publish(NoteChange::Created(id));
        Ok(note)
    }

    /// Updates one or both mutable fields in place.
    ///
    /// `id` and `date_created` are never touched. A patch with no fields is a
    /// no-op that still reports `NotFound` for unknown IDs.
    ///
    /// The current row is loaded before the write; the returned note is that
    /// row with the patch applied.
    pub fn update_note(&self, id: NoteId, patch: NotePatch) -> NoteServiceResult<Note> {
        let started_at = Instant::now();
        if let Err(err) = patch.validate() {
            return Err(log_failure("note_update", err.into()));
        }

        let mut updated = self
            .get_note(id)
            .map_err(|err| log_failure("note_update", err))?
            .ok_or_else(|| log_failure("note_update", NoteServiceError::NotFound(id)))?;
        if patch.is_empty() {
            return Ok(updated);
        }

        self.repo
            .update_note(id, &patch)
            .map_err(|err| log_failure("note_update", err.into()))?;
        patch.apply_to(&mut updated);

        info!(
            "event=note_update module=note_service status=ok note_id={} title_changed={} content_changed={} duration_ms={}",
            id,
            patch.title.is_some(),
            patch.content.is_some(),
            started_at.elapsed().as_millis()
        );
        self.publish(NoteChange::Updated(id));
        Ok(updated)
    }

    /// Replaces both title and content.
    pub fn replace_note(
        &self,
        id: NoteId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> NoteServiceResult<Note> {
        self.update_note(id, NotePatch::full(title, content))
    }

    /// Permanently removes one note.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist, including a repeated delete.
    pub fn delete_note(&self, id: NoteId) -> NoteServiceResult<()> {
        self.repo
            .delete_note(id)
            .map_err(|err| log_failure("note_delete", err.into()))?;

        info!("event=note_delete module=note_service status=ok note_id={id}");
        self.publish(NoteChange::Deleted(vec![id]));
        Ok(())
    }

    /// Removes a set of notes in one transaction.
    ///
    /// Unknown IDs are reported in `missing` and do not block the rest.
    pub fn delete_notes(&mut self, ids: &[NoteId]) -> NoteServiceResult<DeleteManyOutcome> {
        let outcome = self
            .repo
            .delete_notes(ids)
            .map_err(|err| log_failure("notes_delete", err.into()))?;

        info!(
            "event=notes_delete module=note_service status=ok requested={} deleted={} missing={}",
            ids.len(),
            outcome.deleted.len(),
            outcome.missing.len()
        );
        if !outcome.deleted.is_empty() {
            self.publish(NoteChange::Deleted(outcome.deleted.clone()));
        }
        Ok(outcome)
    }

    /// Renders one note for share/export. Never mutates the store.
    pub fn share_text(&self, id: NoteId) -> NoteServiceResult<String> {
        self.get_note(id)?
            .map(|note| note.share_text())
            .ok_or(NoteServiceError::NotFound(id))
    }

    fn publish(&self, change: NoteChange) {
        debug!(
            "event=note_change module=note_service change={} notes={} observers={}",
            change.label(),
            change.ids().len(),
            self.observers.len()
        );
        self.observers.notify(&change);
    }
}

/// Validates create-form input without touching storage.
///
/// Lets the presentation layer disable its save control up front.
pub fn can_submit(title: &str, content: &str) -> bool {
    validate_fields(title, content).is_ok()
}

/// Derives the one-line content preview shown on list cards.
///
/// Takes the first non-blank line, collapses whitespace, and keeps at most
/// 100 chars. Returns `None` for blank content.
pub fn derive_preview_line(content: &str) -> Option<String> {
    let line = content.lines().find(|line| !line.trim().is_empty())?;
    let normalized = WHITESPACE_RE.replace_all(line.trim(), " ");
    Some(normalized.chars().take(PREVIEW_MAX_CHARS).collect())
}

fn log_failure(event: &str, err: NoteServiceError) -> NoteServiceError {
    match &err {
        NoteServiceError::Storage(_) => error!(
            "event={event} module=note_service status=error error_code={} error={err}",
            err.code()
        ),
        _ => warn!(
            "event={event} module=note_service status=rejected error_code={}",
            err.code()
        ),
    }
    err
}

#[cfg(test)]
mod tests {
    use super::{can_submit, derive_preview_line, NoteService};
    use crate::model::note::{Note, NoteId};
    use crate::repo::note_repo::{
        DeleteManyOutcome, NotePatch, NoteRepository, RepoError, RepoResult,
    };
    use crate::service::notify::NoteChange;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Single-slot repository recording the order of calls it receives.
    #[derive(Default)]
    struct RecordingRepo {
        stored: RefCell<Option<Note>>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl NoteRepository for RecordingRepo {
        fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
            self.calls.borrow_mut().push("create");
            *self.stored.borrow_mut() = Some(note.clone());
            Ok(note.id)
        }

        fn update_note(&self, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
            self.calls.borrow_mut().push("update");
            let mut stored = self.stored.borrow_mut();
            let note = stored
                .as_mut()
                .filter(|note| note.id == id)
                .ok_or(RepoError::NotFound(id))?;
            patch.apply_to(note);
            Ok(())
        }

        fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
            self.calls.borrow_mut().push("get");
            Ok(self.stored.borrow().clone().filter(|note| note.id == id))
        }

        fn list_notes(&self) -> RepoResult<Vec<Note>> {
            Ok(self.stored.borrow().clone().into_iter().collect())
        }

        fn delete_note(&self, id: NoteId) -> RepoResult<()> {
            Err(RepoError::NotFound(id))
        }

        fn delete_notes(&mut self, _ids: &[NoteId]) -> RepoResult<DeleteManyOutcome> {
            Ok(DeleteManyOutcome::default())
        }
    }

    #[test]
    fn writes_are_not_followed_by_a_read_back() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let mut service = NoteService::new(RecordingRepo::default());
        let sink = Rc::clone(&changes);
        service.subscribe(move |change: &NoteChange| sink.borrow_mut().push(change.clone()));

        let created = service.create_note("Groceries", "Milk").unwrap();
        assert_eq!(*service.repo.calls.borrow(), vec!["create"]);

        let updated = service
            .update_note(
                created.id,
                NotePatch {
                    title: None,
                    content: Some("Milk, butter".to_string()),
                },
            )
            .unwrap();
        assert_eq!(*service.repo.calls.borrow(), vec!["create", "get", "update"]);

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.date_created, created.date_created);
        assert_eq!(updated.title, "Groceries");
        assert_eq!(updated.content, "Milk, butter");
        assert_eq!(service.repo.stored.borrow().as_ref(), Some(&updated));
        assert_eq!(
            *changes.borrow(),
            vec![
                NoteChange::Created(created.id),
                NoteChange::Updated(created.id)
            ]
        );
    }

    #[test]
    fn invalid_patch_is_rejected_before_any_repository_call() {
        let service = NoteService::new(RecordingRepo::default());
        let result = service.update_note(
            uuid::Uuid::new_v4(),
            NotePatch {
                title: Some(String::new()),
                content: None,
            },
        );
        assert!(result.is_err());
        assert!(service.repo.calls.borrow().is_empty());
    }

    #[test]
    fn preview_uses_first_non_blank_line() {
        let preview = derive_preview_line("\n   \nMilk,   eggs\tbread\nbutter");
        assert_eq!(preview.as_deref(), Some("Milk, eggs bread"));
    }

    #[test]
    fn preview_is_capped_and_none_for_blank_content() {
        let long = "x".repeat(250);
        let preview = derive_preview_line(&long).expect("preview should exist");
        assert_eq!(preview.chars().count(), 100);
        assert_eq!(derive_preview_line(" \n\t"), None);
    }

    #[test]
    fn can_submit_requires_both_fields() {
        assert!(can_submit("Groceries", "Milk"));
        assert!(!can_submit("", "Milk"));
        assert!(!can_submit("Groceries", ""));
    }
}
