//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into note-store use-cases.
//! - Notify observers after successful mutations.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_service;
pub mod notify;
