//! Error kinds surfaced by the graph engine and its orchestration layer.
//!
//! Pure computation (scoring, building) never fails. Failures come from
//! the collaborators (extractor, note store) and from the graph file.

use std::path::PathBuf;

/// Boxed error carried by collaborator failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The concept extractor failed for a note.
    #[error("concept extraction failed: {source}")]
    Extraction {
        #[source]
        source: BoxError,
    },

    /// The durable note store failed.
    #[error("note store error: {source}")]
    Store {
        #[source]
        source: BoxError,
    },

    /// A line of the graph file could not be parsed. The whole load is aborted.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A graph file could not be created, opened, read, written or renamed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    pub fn extraction(err: anyhow::Error) -> Self {
        Self::Extraction { source: err.into() }
    }

    pub fn store(err: anyhow::Error) -> Self {
        Self::Store { source: err.into() }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// True for `Parse` errors (malformed graph file).
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
