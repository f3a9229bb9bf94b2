/// Linear snapshot log with a cursor.
use crate::snapshot::Snapshot;

/// Ordered snapshots plus the index of the one currently displayed.
///
/// `cursor` is `None` exactly when the log is empty. Pushing while the cursor
/// sits behind the end drops the redo branch first.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: Vec<Snapshot>,
    cursor: Option<usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from persisted parts.
    ///
    /// The cursor is clamped into `0..len`. A missing cursor on a non-empty
    /// log points at the newest entry.
    pub fn from_parts(entries: Vec<Snapshot>, cursor: Option<i64>) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let last = entries.len() - 1;
        let cursor = match cursor {
            Some(c) if c <= 0 => 0,
            Some(c) => usize::try_from(c).map_or(last, |c| c.min(last)),
            None => last,
        };
        Self {
            entries,
            cursor: Some(cursor),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Cursor in its persisted form, `-1` for an empty log.
    pub fn cursor_value(&self) -> i64 {
        self.cursor.map_or(-1, |c| c as i64)
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Truncates after the cursor, appends `snapshot`, and evicts from the
    /// front while the log is longer than `max_depth`.
    ///
    /// Returns the number of entries dropped from the redo branch.
    pub fn push(&mut self, snapshot: Snapshot, max_depth: usize) -> usize {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let discarded = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push(snapshot);

        let max_depth = max_depth.max(1);
        if self.entries.len() > max_depth {
            let excess = self.entries.len() - max_depth;
            self.entries.drain(..excess);
        }
        self.cursor = Some(self.entries.len() - 1);
        discarded
    }

    /// Index one step back, without moving.
    pub fn peek_back(&self) -> Option<usize> {
        self.cursor.filter(|&c| c > 0).map(|c| c - 1)
    }

    /// Index one step forward, without moving.
    pub fn peek_forward(&self) -> Option<usize> {
        self.cursor
            .map(|c| c + 1)
            .filter(|&next| next < self.entries.len())
    }

    /// Moves the cursor to `index`. Returns `false` if out of range.
    pub fn seek(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
