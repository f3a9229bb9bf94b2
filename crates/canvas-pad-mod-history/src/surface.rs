/// The document seam the history manager drives.
use anyhow::Result;

use crate::snapshot::Snapshot;

/// Kind of a discrete document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One change reported by the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Affected object, when the change concerns a single object.
    pub object_id: Option<String>,
}

impl ChangeEvent {
    pub fn added(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Added,
            object_id: Some(id.into()),
        }
    }

    pub fn removed(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            object_id: Some(id.into()),
        }
    }

    pub fn modified(id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Modified,
            object_id: Some(id.into()),
        }
    }

    /// A change to document-wide state (background, size).
    pub fn document_modified() -> Self {
        Self {
            kind: ChangeKind::Modified,
            object_id: None,
        }
    }
}

/// A mutable document that can snapshot and restore its whole state.
///
/// Implementations queue a [`ChangeEvent`] for every mutation, including the
/// ones caused by `restore`; the history manager drains them with
/// [`take_events`](DocumentSurface::take_events).
pub trait DocumentSurface {
    /// Serializes the entire document.
    fn serialize(&self) -> Result<Snapshot>;

    /// Replaces the document with `snapshot`.
    ///
    /// Must be atomic: on error the document is left exactly as it was.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Returns to a fresh, empty document.
    fn reset(&mut self);

    /// Drains queued change events, oldest first.
    fn take_events(&mut self) -> Vec<ChangeEvent>;
}
