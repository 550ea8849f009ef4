//! In-memory note storage shared by the note tools.

use std::sync::Arc;

use parking_lot::RwLock;

/// Process-lifetime note storage.
///
/// Notes live for the lifetime of the server process and are shared by every
/// session. Cloning the store clones the handle, not the contents.
#[derive(Clone, Default)]
pub struct NoteStore {
    notes: Arc<RwLock<Vec<String>>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a note and return the new total count.
    pub fn add(&self, content: impl Into<String>) -> usize {
        let mut notes = self.notes.write();
        notes.push(content.into());
        notes.len()
    }

    /// Snapshot of all notes in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.notes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }
}
