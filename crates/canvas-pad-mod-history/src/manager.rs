/// Snapshot history manager for a single document.
///
/// Every change event reported by the document (re)arms a debounce timer.
/// When the timer fires, the whole document is serialized and appended to the
/// log. Undo and redo reload a neighbouring snapshot wholesale. Log and cursor
/// are mirrored into a key-value store so a later session resumes where this
/// one stopped.
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};

use crate::config::HistoryConfig;
use crate::debounce::Debouncer;
use crate::log::HistoryLog;
use crate::persistence::{HistoryStore, KeyValueStore};
use crate::snapshot::Snapshot;
use crate::surface::{ChangeEvent, DocumentSurface};

/// Result of an undo or redo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// The document now shows the snapshot at `cursor`.
    Moved { cursor: usize },
    /// Already at the oldest (undo) or newest (redo) snapshot.
    NothingToDo,
}

/// How a session's history was initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// No stored history; empty log and a fresh document.
    Fresh,
    /// Stored history was loaded and the document restored at `cursor`.
    Resumed { cursor: usize },
    /// Stored history was unusable; started over with a fresh document.
    Recovered,
}

/// Owns a document and its snapshot history.
///
/// Constructed once per document session with [`HistoryManager::hydrate`].
pub struct HistoryManager<S: DocumentSurface> {
    surface: S,
    log: HistoryLog,
    doc_id: String,
    /// Set only while a snapshot is being restored.
    suppressed: bool,
    debouncer: Debouncer,
    config: HistoryConfig,
    /// Optional durable store (None = in-memory only).
    persistence: Option<HistoryStore>,
    hydration: Hydration,
}

impl<S: DocumentSurface> std::fmt::Debug for HistoryManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("doc_id", &self.doc_id)
            .field("len", &self.log.len())
            .field("cursor", &self.log.cursor())
            .field("suppressed", &self.suppressed)
            .field("pending", &self.debouncer.is_pending())
            .field("persistent", &self.persistence.is_some())
            .field("hydration", &self.hydration)
            .finish()
    }
}

impl<S: DocumentSurface> HistoryManager<S> {
    /// Loads stored history for `doc_id` and brings `surface` to the stored
    /// cursor position.
    ///
    /// Never fails: an absent log starts empty, and a corrupt log or snapshot
    /// is logged and replaced by an empty log over a freshly reset document.
    pub fn hydrate(
        doc_id: impl Into<String>,
        config: HistoryConfig,
        surface: S,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let doc_id = doc_id.into();
        let persistence = store.map(|s| HistoryStore::new(s, &doc_id));
        let debouncer = Debouncer::new(config.debounce());
        let mut manager = Self {
            surface,
            log: HistoryLog::new(),
            doc_id,
            suppressed: false,
            debouncer,
            config,
            persistence,
            hydration: Hydration::Fresh,
        };

        manager.suppressed = true;
        manager.hydration = manager.load_persisted();
        manager.surface.take_events();
        manager.suppressed = false;

        if manager.hydration != Hydration::Fresh {
            tracing::info!(
                "Hydrated history for {}: {:?} ({} snapshots)",
                manager.doc_id,
                manager.hydration,
                manager.log.len()
            );
        } else if manager.config.baseline_snapshot {
            if let Err(e) = manager.commit_snapshot() {
                tracing::warn!(
                    "Failed to record baseline snapshot for {}: {e:#}",
                    manager.doc_id
                );
            }
        }
        manager
    }

    /// Hydrates without a durable store, using default settings.
    pub fn in_memory(surface: S) -> Self {
        Self::hydrate("memory", HistoryConfig::default(), surface, None)
    }

    fn load_persisted(&mut self) -> Hydration {
        let Some(pl) = &self.persistence else {
            return Hydration::Fresh;
        };

        let stored = match pl.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return Hydration::Fresh,
            Err(e) => {
                tracing::warn!("Discarding stored history for {}: {e:#}", self.doc_id);
                self.surface.reset();
                return Hydration::Recovered;
            }
        };

        let stored_cursor = stored.cursor;
        let log = HistoryLog::from_parts(stored.entries, stored_cursor);
        let (Some(snapshot), Some(cursor)) = (log.current(), log.cursor()) else {
            return Hydration::Fresh;
        };

        if let Err(e) = self.surface.restore(snapshot) {
            tracing::warn!(
                "Stored snapshot {cursor} for {} is unusable, starting fresh: {e:#}",
                self.doc_id
            );
            self.surface.reset();
            return Hydration::Recovered;
        }

        self.log = log;
        if stored_cursor != Some(cursor as i64) {
            tracing::warn!(
                "Stored cursor {stored_cursor:?} for {} was out of range, using {cursor}",
                self.doc_id
            );
            self.persist_cursor();
        }
        Hydration::Resumed { cursor }
    }

    /// Returns the document ID.
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn hydration(&self) -> Hydration {
        self.hydration
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for edits. Changes are picked up by the next
    /// [`poll`](Self::poll) or [`settle`](Self::settle).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    pub fn cursor(&self) -> Option<usize> {
        self.log.cursor()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    /// Whether a debounced snapshot is waiting to be taken.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// When the pending snapshot is due, for event loops that sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Records one change event at the current time.
    pub fn on_change(&mut self, event: &ChangeEvent) -> bool {
        self.on_change_at(event, Instant::now())
    }

    /// Records one change event and re-arms the debounce timer.
    ///
    /// Returns `false` if the event was ignored because a restore is in
    /// progress.
    pub fn on_change_at(&mut self, event: &ChangeEvent, now: Instant) -> bool {
        if self.suppressed {
            tracing::trace!("Ignoring {:?} during restore", event.kind);
            return false;
        }
        self.debouncer.schedule(now);
        true
    }

    /// [`poll_at`](Self::poll_at) with the current time.
    pub fn poll(&mut self) -> Result<bool> {
        self.poll_at(Instant::now())
    }

    /// Feeds queued document events into the debounce timer and takes the
    /// snapshot once the timer has run out.
    ///
    /// Returns whether a snapshot was committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn poll_at(&mut self, now: Instant) -> Result<bool> {
        for event in self.surface.take_events() {
            self.on_change_at(&event, now);
        }
        if self.debouncer.fire_if_due(now) {
            self.commit_snapshot()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Commits immediately if any change is queued or a snapshot is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn settle(&mut self) -> Result<bool> {
        if self.suppressed {
            return Ok(false);
        }
        let had_events = !self.surface.take_events().is_empty();
        let was_pending = self.debouncer.cancel();
        if had_events || was_pending {
            self.commit_snapshot()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Takes a snapshot right now, bypassing the debounce window.
    ///
    /// Returns the new cursor, or `None` if skipped during a restore.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn commit(&mut self) -> Result<Option<usize>> {
        if self.suppressed {
            return Ok(None);
        }
        self.debouncer.cancel();
        self.surface.take_events();
        self.commit_snapshot().map(Some)
    }

    fn commit_snapshot(&mut self) -> Result<usize> {
        let snapshot = self
            .surface
            .serialize()
            .with_context(|| format!("Failed to snapshot document {}", self.doc_id))?;
        let bytes = snapshot.len();
        let discarded = self.log.push(snapshot, self.config.max_history_depth);
        let cursor = self.log.len() - 1;
        if discarded > 0 {
            tracing::debug!("Dropped {discarded} redo snapshots for {}", self.doc_id);
        }
        tracing::debug!(
            "Committed snapshot {cursor} for {} ({bytes} bytes)",
            self.doc_id
        );
        self.persist_all();
        Ok(cursor)
    }

    /// Steps back one snapshot.
    ///
    /// Pending edits are committed first so they become their own step.
    ///
    /// # Errors
    ///
    /// Returns an error if pending edits cannot be committed or the target
    /// snapshot cannot be restored. The cursor and document are unchanged in
    /// that case.
    pub fn undo(&mut self) -> Result<HistoryStep> {
        self.settle()
            .context("Failed to record pending changes before undo")?;
        let Some(target) = self.log.peek_back() else {
            return Ok(HistoryStep::NothingToDo);
        };
        self.restore_to(target)?;
        Ok(HistoryStep::Moved { cursor: target })
    }

    /// Steps forward one snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`undo`](Self::undo).
    pub fn redo(&mut self) -> Result<HistoryStep> {
        self.settle()
            .context("Failed to record pending changes before redo")?;
        let Some(target) = self.log.peek_forward() else {
            return Ok(HistoryStep::NothingToDo);
        };
        self.restore_to(target)?;
        Ok(HistoryStep::Moved { cursor: target })
    }

    fn restore_to(&mut self, target: usize) -> Result<()> {
        let snapshot: &Snapshot = self
            .log
            .get(target)
            .ok_or_else(|| anyhow!("Snapshot {target} missing from history"))?;

        self.suppressed = true;
        let result = self.surface.restore(snapshot);
        // Re-render events from the restore itself are not edits.
        let echoed = self.surface.take_events().len();
        self.suppressed = false;

        if let Err(e) = result {
            tracing::warn!(
                "Failed to restore snapshot {target} for {}: {e:#}",
                self.doc_id
            );
            return Err(e.context(format!("Failed to restore snapshot {target}")));
        }

        self.log.seek(target);
        tracing::debug!(
            "Restored snapshot {target} for {} ({echoed} events suppressed)",
            self.doc_id
        );
        self.persist_cursor();
        Ok(())
    }

    /// Clears all history from the store and memory.
    ///
    /// The document itself is left as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored keys cannot be removed. The in-memory
    /// history is kept in that case.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(pl) = &self.persistence {
            pl.delete().context("Failed to clear history from the store")?;
        }

        self.log.clear();
        self.debouncer.cancel();
        self.surface.take_events();
        Ok(())
    }

    /// Ends the session: cancels any pending snapshot and returns the
    /// document.
    pub fn teardown(mut self) -> S {
        if self.debouncer.cancel() {
            tracing::debug!("Discarded pending snapshot for {}", self.doc_id);
        }
        self.surface
    }

    fn persist_all(&self) {
        if let Some(pl) = &self.persistence {
            if let Err(e) = pl.save_all(&self.log) {
                tracing::warn!("Failed to persist history for {}: {e:#}", self.doc_id);
            }
        }
    }

    fn persist_cursor(&self) {
        if let Some(pl) = &self.persistence {
            if let Err(e) = pl.save_cursor(&self.log) {
                tracing::warn!("Failed to persist cursor for {}: {e:#}", self.doc_id);
            }
        }
    }
}
