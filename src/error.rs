//! Error types for the question-answering core.
//!
//! A missing match is not an error: `QaStore::find` returns `None` and the
//! engine answers with `AnswerResult::NeedsTeaching`.

use std::path::PathBuf;

/// Which durable write an operation was performing when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Appending to the learned-answer audit log
    AuditLog,
    /// Appending to the main question-answer store
    MainStore,
    /// Appending a record to the history ledger
    History,
    /// Rewriting the personality counter record
    Counters,
    /// Writing the session summary report
    Report,
}

impl std::fmt::Display for WriteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteStep::AuditLog => write!(f, "learned audit log"),
            WriteStep::MainStore => write!(f, "question-answer store"),
            WriteStep::History => write!(f, "history ledger"),
            WriteStep::Counters => write!(f, "personality counters"),
            WriteStep::Report => write!(f, "summary report"),
        }
    }
}

/// Main error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A durable write failed; in-memory state was left untouched
    #[error("could not save to {step} ({}): {source}", .path.display())]
    Persistence {
        step: WriteStep,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audit log was written, the main store was not, and the audit line
    /// could not be removed again
    #[error(
        "learn left {} ahead of the main store: {main_store_error}; rollback failed: {rollback_error}",
        .audit_log.display()
    )]
    PartialLearn {
        audit_log: PathBuf,
        main_store_error: std::io::Error,
        rollback_error: std::io::Error,
    },

    /// A persisted record could not be parsed
    #[error("malformed record in {}: {reason}", .path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    /// An existing file could not be read
    #[error("could not read {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input that cannot be stored in the flat formats
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// `provide_answer` was called with nothing waiting to be taught
    #[error("no question is waiting for an answer")]
    NoPendingQuestion,
}

impl Error {
    pub(crate) fn persistence(step: WriteStep, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Persistence {
            step,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Load {
            path: path.into(),
            source,
        }
    }

    /// True for failures that touched the disk, as opposed to rejected input
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence { .. } | Error::PartialLearn { .. })
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;
