//! SQLite note store
//!
//! Three tables:
//! - `notes(id, text, created_at)`
//! - `concepts(id, name UNIQUE)`
//! - `note_concepts(note_id, position, concept_id)`: ordered assignment
//!
//! The connection sits behind a `tokio::sync::Mutex`; every call is a short
//! synchronous transaction.

use super::models::StoredNote;
use super::traits::NoteStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    text        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS concepts (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS note_concepts (
    note_id     INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    concept_id  INTEGER NOT NULL REFERENCES concepts(id),
    PRIMARY KEY (note_id, position)
);
CREATE INDEX IF NOT EXISTS idx_note_concepts_concept ON note_concepts(concept_id);
";

pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

impl SqliteNoteStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open note store at {}", path.display()))?;
        Self::init(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory note store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to create note store schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    async fn add_note(&self, text: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO notes (text, created_at) VALUES (?1, ?2)",
            params![text, Utc::now().to_rfc3339()],
        )
        .context("Failed to insert note")?;
        let id = conn.last_insert_rowid();
        tracing::debug!(note_id = id, "Stored note");
        Ok(id)
    }

    async fn fetch_all_notes(&self) -> Result<Vec<StoredNote>> {
        let conn = self.conn.lock().await;

        let mut notes: BTreeMap<i64, StoredNote> = BTreeMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, text, created_at FROM notes ORDER BY id")
                .context("Failed to prepare note query")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })
                .context("Failed to query notes")?;
            for row in rows {
                let (id, text, created_at) = row.context("Failed to read note row")?;
                notes.insert(
                    id,
                    StoredNote {
                        id,
                        text,
                        concepts: Vec::new(),
                        created_at: parse_timestamp(&created_at),
                    },
                );
            }
        }

        let mut stmt = conn
            .prepare(
                "SELECT nc.note_id, c.name FROM note_concepts nc \
                 JOIN concepts c ON c.id = nc.concept_id \
                 ORDER BY nc.note_id, nc.position",
            )
            .context("Failed to prepare concept query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .context("Failed to query note concepts")?;
        for row in rows {
            let (note_id, name) = row.context("Failed to read concept row")?;
            if let Some(note) = notes.get_mut(&note_id) {
                note.concepts.push(name);
            }
        }

        Ok(notes.into_values().collect())
    }

    async fn upsert_concepts(&self, note_id: i64, concepts: &[String]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let exists = tx
            .query_row("SELECT 1 FROM notes WHERE id = ?1", params![note_id], |_| Ok(()))
            .optional()
            .context("Failed to look up note")?
            .is_some();
        if !exists {
            anyhow::bail!("Note {} not found", note_id);
        }

        tx.execute("DELETE FROM note_concepts WHERE note_id = ?1", params![note_id])
            .context("Failed to clear note concepts")?;

        for (position, name) in concepts.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO concepts (name) VALUES (?1)",
                params![name],
            )
            .context("Failed to insert concept")?;
            let concept_id: i64 = tx
                .query_row(
                    "SELECT id FROM concepts WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .context("Failed to resolve concept id")?;
            tx.execute(
                "INSERT INTO note_concepts (note_id, position, concept_id) VALUES (?1, ?2, ?3)",
                params![note_id, position as i64, concept_id],
            )
            .context("Failed to link concept")?;
        }

        tx.commit().context("Failed to commit concepts")?;
        tracing::debug!(note_id, count = concepts.len(), "Upserted concepts");
        Ok(())
    }
}
