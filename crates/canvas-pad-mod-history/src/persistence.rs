/// Durable key-value persistence for snapshot history.
///
/// History for a document lives under three string keys:
/// - `{doc_id}:canvas_history`: JSON array of snapshot strings (the log)
/// - `{doc_id}:canvas_history_cursor`: decimal cursor, `-1` when empty
/// - `{doc_id}:canvas_latest`: snapshot under the cursor (cache only)
///
/// `RedbStore` keeps them in a single redb table; `MemoryStore` in a map.
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use crate::log::HistoryLog;
use crate::snapshot::Snapshot;

/// Key-value table: string key → string value.
const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("kv");

const LOG_SUFFIX: &str = ":canvas_history";
const CURSOR_SUFFIX: &str = ":canvas_history_cursor";
const LATEST_SUFFIX: &str = ":canvas_latest";

/// A synchronous string-keyed store that survives restarts.
///
/// `set_many` and `remove_many` apply all entries or none.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    /// All keys, in ascending order.
    fn keys(&self) -> Result<Vec<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }
}

/// Key-value store backed by redb.
///
/// Shared across documents via `Arc<RedbStore>`.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish()
    }
}

impl RedbStore {
    /// Opens or creates `history.redb` in the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("history.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open history database: {}", db_path.display()))?;

        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(KV_TABLE)
                .context("Failed to create kv table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        Ok(Arc::new(Self { db }))
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(KV_TABLE)
            .context("Failed to open kv table")?;

        match table
            .get(key)
            .with_context(|| format!("Failed to read key {key}"))?
        {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open kv table")?;
            for (key, value) in entries {
                table
                    .insert(*key, *value)
                    .with_context(|| format!("Failed to write key {key}"))?;
            }
        }
        write_txn
            .commit()
            .context("Failed to commit write transaction")?;
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open kv table")?;
            for key in keys {
                table
                    .remove(*key)
                    .with_context(|| format!("Failed to remove key {key}"))?;
            }
        }
        write_txn.commit().context("Failed to commit removal")?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(KV_TABLE)
            .context("Failed to open kv table")?;

        let mut keys = Vec::new();
        for entry in table.iter().context("Failed to iterate kv table")? {
            let (key_guard, _) = entry.context("Failed to read kv entry")?;
            keys.push(key_guard.value().to_string());
        }
        Ok(keys)
    }
}

/// In-memory store, for tests and sessions that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.lock()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Store keys for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryKeys {
    pub log: String,
    pub cursor: String,
    pub latest: String,
}

impl HistoryKeys {
    pub fn for_document(doc_id: &str) -> Self {
        Self {
            log: format!("{doc_id}{LOG_SUFFIX}"),
            cursor: format!("{doc_id}{CURSOR_SUFFIX}"),
            latest: format!("{doc_id}{LATEST_SUFFIX}"),
        }
    }
}

/// Lists the ids of every document with a stored log.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list_documents(store: &dyn KeyValueStore) -> Result<Vec<String>> {
    let keys = store.keys().context("Failed to list store keys")?;
    Ok(keys
        .iter()
        .filter_map(|k| k.strip_suffix(LOG_SUFFIX))
        .map(str::to_string)
        .collect())
}

/// Serializes the log entries as a JSON array of strings.
pub fn encode_log(entries: &[Snapshot]) -> Result<String> {
    serde_json::to_string(entries).context("Failed to serialize history log")
}

/// Parses a JSON array of snapshot strings.
pub fn decode_log(raw: &str) -> Result<Vec<Snapshot>> {
    serde_json::from_str(raw).context("Failed to parse stored history log")
}

/// Parses a stored decimal cursor. Garbage reads as `None`.
pub fn decode_cursor(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Raw history read back from the store.
#[derive(Debug)]
pub struct StoredHistory {
    pub entries: Vec<Snapshot>,
    pub cursor: Option<i64>,
}

/// History persistence for one document on top of any [`KeyValueStore`].
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    keys: HistoryKeys,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("keys", &self.keys)
            .finish()
    }
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, doc_id: &str) -> Self {
        Self {
            store,
            keys: HistoryKeys::for_document(doc_id),
        }
    }

    pub fn keys(&self) -> &HistoryKeys {
        &self.keys
    }

    /// Reads the stored log and cursor.
    ///
    /// Returns `None` if no log was ever written for this document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or the log is corrupt.
    /// An unparsable cursor is not an error; it reads as `None`.
    pub fn load(&self) -> Result<Option<StoredHistory>> {
        let Some(raw_log) = self
            .store
            .get(&self.keys.log)
            .context("Failed to read history log")?
        else {
            return Ok(None);
        };
        let entries = decode_log(&raw_log)?;
        let cursor = self
            .store
            .get(&self.keys.cursor)
            .context("Failed to read history cursor")?
            .and_then(|raw| decode_cursor(&raw));
        Ok(Some(StoredHistory { entries, cursor }))
    }

    /// Writes log, cursor and latest snapshot in one store transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_all(&self, log: &HistoryLog) -> Result<()> {
        let encoded = encode_log(log.entries())?;
        let cursor = log.cursor_value().to_string();
        let mut entries = vec![
            (self.keys.log.as_str(), encoded.as_str()),
            (self.keys.cursor.as_str(), cursor.as_str()),
        ];
        if let Some(latest) = log.current() {
            entries.push((self.keys.latest.as_str(), latest.as_str()));
        }
        self.store
            .set_many(&entries)
            .context("Failed to persist history log")
    }

    /// Writes the cursor and latest snapshot; the log itself is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_cursor(&self, log: &HistoryLog) -> Result<()> {
        let cursor = log.cursor_value().to_string();
        let mut entries = vec![(self.keys.cursor.as_str(), cursor.as_str())];
        if let Some(latest) = log.current() {
            entries.push((self.keys.latest.as_str(), latest.as_str()));
        }
        self.store
            .set_many(&entries)
            .context("Failed to persist history cursor")
    }

    /// Reads the cached latest snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load_latest(&self) -> Result<Option<Snapshot>> {
        Ok(self
            .store
            .get(&self.keys.latest)
            .context("Failed to read latest snapshot")?
            .map(Snapshot::from))
    }

    /// Removes every key of this document.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    pub fn delete(&self) -> Result<()> {
        self.store
            .remove_many(&[
                self.keys.log.as_str(),
                self.keys.cursor.as_str(),
                self.keys.latest.as_str(),
            ])
            .context("Failed to delete stored history")
    }
}
