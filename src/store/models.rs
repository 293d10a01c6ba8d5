//! Note store records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw note with the concepts last assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNote {
    pub id: i64,
    pub text: String,
    /// Ordered as given to the last `upsert_concepts` call
    #[serde(default)]
    pub concepts: Vec<String>,
    pub created_at: DateTime<Utc>,
}
