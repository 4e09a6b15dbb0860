//! Core domain logic for HAYAI Notes.
//! This crate is the single source of truth for note storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{default_log_level, parse_log_level, LogSettings, StoreConfig};
pub use logging::{init_logging, init_logging_from_config, logging_status};
pub use model::note::{Note, NoteId, NoteValidationError};
pub use repo::note_repo::{
    DeleteManyOutcome, NotePatch, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
};
pub use service::note_service::{
    can_submit, derive_preview_line, NoteService, NoteServiceError, NoteServiceResult,
    NoteSummary,
};
pub use service::notify::{NoteChange, NoteObserver};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
