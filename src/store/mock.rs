//! In-memory mock implementation of NoteStore for testing.
//!
//! Notes live in a `tokio::sync::RwLock<BTreeMap<i64, StoredNote>>` so
//! `fetch_all_notes` comes back in id order for free. Failures can be switched
//! on per operation.

use super::models::StoredNote;
use super::traits::NoteStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MockNoteStore {
    pub notes: RwLock<BTreeMap<i64, StoredNote>>,
    next_id: AtomicI64,
    fail_fetch: AtomicBool,
    fail_upsert_for: RwLock<HashSet<i64>>,
}

impl MockNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed notes with fixed concepts, returning their ids.
    pub async fn seed(&self, notes: &[(&str, &[&str])]) -> Vec<i64> {
        let mut ids = Vec::with_capacity(notes.len());
        for (text, concepts) in notes {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.notes.write().await.insert(
                id,
                StoredNote {
                    id,
                    text: text.to_string(),
                    concepts: concepts.iter().map(|c| c.to_string()).collect(),
                    created_at: Utc::now(),
                },
            );
            ids.push(id);
        }
        ids
    }

    /// Make `fetch_all_notes` fail.
    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make `upsert_concepts` fail for `note_id`.
    pub async fn fail_upsert_for(&self, note_id: i64) {
        self.fail_upsert_for.write().await.insert(note_id);
    }

    /// Turn off every failure switch.
    pub async fn clear_failures(&self) {
        self.fail_fetch(false);
        self.fail_upsert_for.write().await.clear();
    }

    /// Concepts currently stored for `note_id`.
    pub async fn concepts_of(&self, note_id: i64) -> Option<Vec<String>> {
        self.notes
            .read()
            .await
            .get(&note_id)
            .map(|n| n.concepts.clone())
    }
}

#[async_trait]
impl NoteStore for MockNoteStore {
    async fn add_note(&self, text: &str) -> Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.notes.write().await.insert(
            id,
            StoredNote {
                id,
                text: text.to_string(),
                concepts: Vec::new(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn fetch_all_notes(&self) -> Result<Vec<StoredNote>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("mock store: fetch disabled");
        }
        Ok(self.notes.read().await.values().cloned().collect())
    }

    async fn upsert_concepts(&self, note_id: i64, concepts: &[String]) -> Result<()> {
        if self.fail_upsert_for.read().await.contains(&note_id) {
            anyhow::bail!("mock store: upsert disabled for note {}", note_id);
        }
        let mut notes = self.notes.write().await;
        match notes.get_mut(&note_id) {
            Some(note) => {
                note.concepts = concepts.to_vec();
                Ok(())
            }
            None => anyhow::bail!("Note {} not found", note_id),
        }
    }
}
