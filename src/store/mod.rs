//! Durable note store
//!
//! Raw notes and their concept assignments, independent of the graph file.
//!
//! - `NoteStore` trait: async interface (add, fetch all, upsert concepts)
//! - `SqliteNoteStore`: rusqlite-backed implementation
//! - `MockNoteStore`: in-memory implementation for tests

pub mod mock;
pub mod models;
pub mod sqlite;
pub mod traits;

pub use mock::MockNoteStore;
pub use models::StoredNote;
pub use sqlite::SqliteNoteStore;
pub use traits::NoteStore;
