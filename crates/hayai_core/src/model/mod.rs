//! Domain model for persisted notes.
//!
//! # Responsibility
//! - Define the canonical `Note` record owned by the note store.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod note;
