use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading a persisted index snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed index record at line {line}: {reason}: {content:?}")]
    Format {
        line: usize,
        content: String,
        reason: &'static str,
    },
    #[error("term {term:?} listed twice (second record at line {line})")]
    DuplicateTerm { line: usize, term: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures while loading a corpus from disk.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("unreadable document {path}: {source}")]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walking corpus directory: {0}")]
    Walk(#[from] walkdir::Error),
}
