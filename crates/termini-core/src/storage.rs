//! Storage contract and the SQLite-backed slot store.
//!
//! The crawler treats storage as a black box: `init_schema` once, then one
//! `upsert` per completed crawl. The summary distinguishes records opened
//! (never seen before) from records touched (known, but with changed
//! mutable fields).

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::types::NormalizedSlot;

/// Outcome of one upsert batch
#[derive(Debug, Clone)]
pub struct UpsertSummary {
    /// Records not previously known to the store
    pub opened: usize,
    /// Previously known records whose mutable fields changed
    pub touched: usize,
    /// Dedup keys of every record in the batch, in batch order
    pub seen_keys: Vec<String>,
    /// When the batch was applied
    pub timestamp: DateTime<Utc>,
}

/// Contract the crawl results are handed to
pub trait SlotStore {
    /// Create the schema when missing. Idempotent; called once before any
    /// crawl.
    fn init_schema(&self) -> Result<()>;

    /// Insert new records and refresh known ones.
    fn upsert(&self, slots: &[NormalizedSlot]) -> Result<UpsertSummary>;
}

/// SQLite implementation of [`SlotStore`]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories as
    /// needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

impl SlotStore for SqliteStore {
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS slots (
                dedup_key     TEXT PRIMARY KEY,
                date_text     TEXT NOT NULL,
                time_text     TEXT NOT NULL,
                zone          INTEGER,
                town          TEXT,
                exam_type     TEXT NOT NULL,
                places_left   INTEGER,
                interpreter   INTEGER NOT NULL,
                categories    TEXT NOT NULL,
                location      TEXT,
                source_page   INTEGER NOT NULL,
                first_seen_at TEXT NOT NULL,
                last_seen_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_slots_date ON slots(date_text);
            "#,
        )?;
        Ok(())
    }

    fn upsert(&self, slots: &[NormalizedSlot]) -> Result<UpsertSummary> {
        let timestamp = Utc::now();
        let stamp = timestamp.to_rfc3339();

        let mut opened = 0;
        let mut touched = 0;
        let mut seen_keys = Vec::with_capacity(slots.len());

        for slot in slots {
            let key = slot.dedup_key().to_string();
            let categories = slot.categories.join(",");

            let existing: Option<(String, Option<i64>, i64, Option<String>, i64)> = self
                .conn
                .query_row(
                    "SELECT exam_type, places_left, interpreter, location, source_page
                     FROM slots WHERE dedup_key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;

            match existing {
                None => {
                    self.conn.execute(
                        "INSERT INTO slots (dedup_key, date_text, time_text, zone, town,
                                            exam_type, places_left, interpreter, categories,
                                            location, source_page, first_seen_at, last_seen_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
                        params![
                            key,
                            slot.date_text,
                            slot.time_text,
                            slot.zone,
                            slot.town,
                            slot.exam_type.as_str(),
                            slot.places_left,
                            slot.interpreter as i64,
                            categories,
                            slot.location,
                            slot.source_page,
                            stamp,
                        ],
                    )?;
                    opened += 1;
                }
                Some((exam_type, places_left, interpreter, location, source_page)) => {
                    let changed = exam_type != slot.exam_type.as_str()
                        || places_left != slot.places_left.map(i64::from)
                        || interpreter != slot.interpreter as i64
                        || location.as_deref() != slot.location.as_deref()
                        || source_page != i64::from(slot.source_page);

                    if changed {
                        self.conn.execute(
                            "UPDATE slots
                             SET exam_type = ?2, places_left = ?3, interpreter = ?4,
                                 location = ?5, source_page = ?6, last_seen_at = ?7
                             WHERE dedup_key = ?1",
                            params![
                                key,
                                slot.exam_type.as_str(),
                                slot.places_left,
                                slot.interpreter as i64,
                                slot.location,
                                slot.source_page,
                                stamp,
                            ],
                        )?;
                        touched += 1;
                    } else {
                        self.conn.execute(
                            "UPDATE slots SET last_seen_at = ?2 WHERE dedup_key = ?1",
                            params![key, stamp],
                        )?;
                    }
                }
            }

            seen_keys.push(key);
        }

        tracing::debug!(opened, touched, total = slots.len(), "upsert applied");
        Ok(UpsertSummary {
            opened,
            touched,
            seen_keys,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExamType;

    fn slot(time: &str, places: Option<u32>) -> NormalizedSlot {
        NormalizedSlot {
            date_text: "13. 9. 2025".to_string(),
            time_text: time.to_string(),
            zone: Some(2),
            town: Some("Ljubljana".to_string()),
            exam_type: ExamType::Practical,
            places_left: places,
            interpreter: false,
            categories: vec!["B".to_string()],
            location: Some("Območje 2 , Ljubljana".to_string()),
            source_page: 0,
        }
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store.init_schema().unwrap();
    }

    #[test]
    fn test_first_upsert_opens_records() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();

        let summary = store.upsert(&[slot("08:00", Some(3)), slot("09:00", Some(1))]).unwrap();
        assert_eq!(summary.opened, 2);
        assert_eq!(summary.touched, 0);
        assert_eq!(summary.seen_keys.len(), 2);
    }

    #[test]
    fn test_unchanged_records_are_neither_opened_nor_touched() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();

        store.upsert(&[slot("08:00", Some(3))]).unwrap();
        let summary = store.upsert(&[slot("08:00", Some(3))]).unwrap();
        assert_eq!(summary.opened, 0);
        assert_eq!(summary.touched, 0);
        assert_eq!(summary.seen_keys.len(), 1);
    }

    #[test]
    fn test_changed_capacity_touches_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_schema().unwrap();

        store.upsert(&[slot("08:00", Some(3))]).unwrap();
        let summary = store.upsert(&[slot("08:00", Some(1))]).unwrap();
        assert_eq!(summary.opened, 0);
        assert_eq!(summary.touched, 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("slots.db");
        let store = SqliteStore::open(&path).unwrap();
        store.init_schema().unwrap();
        assert!(path.exists());
    }
}
