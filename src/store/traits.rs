//! NoteStore trait definition
//!
//! Durable home of the raw notes and their concept assignments, kept apart
//! from the graph file. Implementations must be Send + Sync so the store can
//! be shared as `Arc<dyn NoteStore>`.

use super::models::StoredNote;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a new note and return its id. Ids ascend with insertion.
    async fn add_note(&self, text: &str) -> Result<i64>;

    /// Every note, ascending by id, with its ordered concepts.
    async fn fetch_all_notes(&self) -> Result<Vec<StoredNote>>;

    /// Replace the concept list of `note_id`, keeping the given order.
    ///
    /// # Errors
    ///
    /// Fails when `note_id` does not exist.
    async fn upsert_concepts(&self, note_id: i64, concepts: &[String]) -> Result<()>;
}
