//! History ledger - append-only log of answered questions
//!
//! Each interaction is stored as three lines:
//!
//! ```text
//! USER: <question>
//! BOT: <answer>
//! ---
//! ```
//!
//! The ledger never rewrites or truncates existing records.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result, WriteStep};
use crate::storage;
use crate::types::ConversationEntry;

const QUESTION_MARKER: &str = "USER:";
const ANSWER_MARKER: &str = "BOT:";
const TERMINATOR: &str = "---";

/// File-backed conversation history plus the entries of the current session
pub struct HistoryLedger {
    path: PathBuf,
    session: Vec<ConversationEntry>,
}

impl HistoryLedger {
    /// Open the ledger at `path`; the file is created on first append
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session: Vec::new(),
        }
    }

    /// Write a record to disk, then remember it for this session
    pub fn append(&mut self, entry: ConversationEntry) -> Result<()> {
        let record = entry.to_record();
        storage::append_line(&self.path, record.trim_end_matches('\n'))
            .map_err(|e| Error::persistence(WriteStep::History, &self.path, e))?;

        debug!("Appended history record to {}", self.path.display());
        self.session.push(entry);
        Ok(())
    }

    /// The last `n` persisted records, oldest first
    pub fn tail(&self, n: usize) -> Result<Vec<ConversationEntry>> {
        let mut records = self.load_all()?;
        let start = records.len().saturating_sub(n);
        Ok(records.split_off(start))
    }

    /// Every persisted record, oldest first.
    ///
    /// Bytes that are not valid UTF-8 (a write cut inside a multi-byte
    /// character) are replaced and end up in a record that gets skipped.
    pub fn load_all(&self) -> Result<Vec<ConversationEntry>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(parse_records(&String::from_utf8_lossy(&bytes), &self.path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::load(&self.path, e)),
        }
    }

    /// Nothing to do: every append is already on disk
    pub fn flush_session(&mut self) -> Result<()> {
        Ok(())
    }

    /// Entries appended through this ledger since it was opened
    pub fn session(&self) -> &[ConversationEntry] {
        &self.session
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse ledger text into records.
///
/// A record ends at a line that is exactly `---`. A `USER:` line always opens a
/// new record, which drops any fragment left by an interrupted write. Records
/// without both markers and an unterminated tail are skipped.
pub fn parse_records(content: &str, path: &Path) -> Vec<ConversationEntry> {
    let mut records = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line == TERMINATOR {
            match parse_record(&pending) {
                Some(entry) => records.push(entry),
                None if pending.iter().all(|l| l.trim().is_empty()) => {}
                None => warn!("Skipping malformed history record in {}: {:?}", path.display(), pending),
            }
            pending.clear();
        } else if line.starts_with(QUESTION_MARKER) && !pending.is_empty() {
            warn!("Dropping incomplete history record in {}: {:?}", path.display(), pending);
            pending.clear();
            pending.push(line);
        } else {
            pending.push(line);
        }
    }

    if pending.iter().any(|l| !l.trim().is_empty()) {
        debug!("Ignoring unterminated history fragment in {}", path.display());
    }
    records
}

fn parse_record(lines: &[&str]) -> Option<ConversationEntry> {
    let mut lines = lines.iter().filter(|l| !l.trim().is_empty());
    let question = lines.next()?.strip_prefix(QUESTION_MARKER)?.trim();
    let answer = lines.next()?.strip_prefix(ANSWER_MARKER)?.trim();
    Some(ConversationEntry::new(question, answer))
}
