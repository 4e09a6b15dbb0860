//! Change notification for note store observers.
//!
//! # Responsibility
//! - Describe what a successful mutation changed (`NoteChange`).
//! - Fan out change events to registered observers.
//!
//! # Invariants
//! - Observers are only called after the mutation has committed.
//! - Failed and no-op operations emit nothing.

use crate::model::note::NoteId;

/// A committed change to the note collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteChange {
    Created(NoteId),
    Updated(NoteId),
    /// One or more notes removed by a single logical operation.
    Deleted(Vec<NoteId>),
}

impl NoteChange {
    /// Event label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
        }
    }

    /// IDs touched by the change.
    pub fn ids(&self) -> &[NoteId] {
        match self {
            Self::Created(id) | Self::Updated(id) => std::slice::from_ref(id),
            Self::Deleted(ids) => ids.as_slice(),
        }
    }
}

/// Receives note collection changes, typically to refresh a displayed list.
pub trait NoteObserver {
    fn notes_changed(&self, change: &NoteChange);
}

impl<F> NoteObserver for F
where
    F: Fn(&NoteChange),
{
    fn notes_changed(&self, change: &NoteChange) {
        self(change)
    }
}

/// Ordered list of registered observers.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn NoteObserver>>,
}

impl ObserverList {
    pub fn push(&mut self, observer: Box<dyn NoteObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers `change` to every observer in registration order.
    pub fn notify(&self, change: &NoteChange) {
        for observer in &self.observers {
            observer.notes_changed(change);
        }
    }
}
