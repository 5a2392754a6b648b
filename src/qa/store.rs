//! Keyword question-answer store backed by a flat text file
//!
//! Each line of the store is `key|variant1;;;variant2;;;...`. Blank lines and
//! lines starting with `#` are ignored. Learned answers are appended through
//! [`LearnTransaction`] and also recorded in a separate audit log as
//! `question|answer`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::transaction::LearnTransaction;
use crate::error::{Error, Result};
use crate::types::flatten_line;

/// Separator between a key and its answer variants
pub const KEY_DELIMITER: char = '|';
/// Separator between answer variants
pub const VARIANT_DELIMITER: &str = ";;;";

/// Order in which keys are scanned by [`QaStore::find`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// File order: an older entry shadows a newer one with the same key
    #[default]
    FirstLoaded,
    /// Reverse file order: the most recently learned entry wins
    MostRecent,
}

/// One keyword and its answer variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    /// Lowercase keyword or phrase, never empty
    pub key: String,
    /// At least one non-empty answer
    pub variants: Vec<String>,
}

impl QaEntry {
    /// Parse one store line.
    ///
    /// Returns `Ok(None)` for blank and comment lines and `Err` with a reason
    /// for lines that cannot form an entry.
    pub fn parse_line(line: &str) -> std::result::Result<Option<Self>, &'static str> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (key, rest) = line
            .split_once(KEY_DELIMITER)
            .ok_or("missing key delimiter")?;

        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err("empty key");
        }

        let variants: Vec<String> = rest
            .split(VARIANT_DELIMITER)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
        if variants.is_empty() {
            return Err("no answer variants");
        }

        Ok(Some(Self { key, variants }))
    }

    /// Render back to a store line (without newline)
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.key, KEY_DELIMITER, self.variants.join(VARIANT_DELIMITER))
    }
}

/// In-memory table of [`QaEntry`] mirrored by the store file
pub struct QaStore {
    path: PathBuf,
    learned_path: PathBuf,
    entries: Vec<QaEntry>,
    match_order: MatchOrder,
}

impl QaStore {
    /// Load the store at `path`. A missing file yields an empty store.
    ///
    /// `learned_path` is the audit log that [`QaStore::learn`] appends to.
    pub fn load(path: impl Into<PathBuf>, learned_path: impl Into<PathBuf>, match_order: MatchOrder) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No question-answer store at {}, starting empty", path.display());
                String::new()
            }
            Err(e) => return Err(Error::load(&path, e)),
        };

        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            match QaEntry::parse_line(line) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(reason) => warn!("Skipping {}:{}: {}", path.display(), idx + 1, reason),
            }
        }

        info!("Loaded {} question-answer entries from {}", entries.len(), path.display());
        Ok(Self {
            path,
            learned_path: learned_path.into(),
            entries,
            match_order,
        })
    }

    /// Answer variants of the first key contained in `question`.
    ///
    /// Matching is a case-insensitive substring test; keys are scanned in
    /// the configured [`MatchOrder`].
    pub fn find(&self, question: &str) -> Option<&[String]> {
        let q = question.to_lowercase();
        let hit = match self.match_order {
            MatchOrder::FirstLoaded => self.entries.iter().find(|e| q.contains(&e.key)),
            MatchOrder::MostRecent => self.entries.iter().rev().find(|e| q.contains(&e.key)),
        };
        hit.map(|e| e.variants.as_slice())
    }

    /// Store `answer` as the single variant for `question`.
    ///
    /// Both files are written before the entry becomes visible to `find`.
    /// Nothing is written when the input is rejected.
    pub fn learn(&mut self, question: &str, answer: &str) -> Result<&QaEntry> {
        let question = flatten_line(question);
        let answer = flatten_line(answer);

        Self::check_question(&question)?;
        if answer.is_empty() {
            return Err(Error::InvalidEntry("answer is empty".into()));
        }
        if answer.contains(VARIANT_DELIMITER) {
            return Err(Error::InvalidEntry(format!("answer may not contain '{}'", VARIANT_DELIMITER)));
        }

        let entry = QaEntry {
            key: question.to_lowercase(),
            variants: vec![answer.clone()],
        };

        LearnTransaction::new(&self.learned_path, &self.path).commit(
            &format!("{}{}{}", question, KEY_DELIMITER, answer),
            &entry.to_line(),
        )?;

        info!("Learned answer for '{}'", entry.key);
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Whether `question` (already flattened) can become a store key
    pub fn check_question(question: &str) -> Result<()> {
        if question.is_empty() {
            return Err(Error::InvalidEntry("question is empty".into()));
        }
        if question.contains(KEY_DELIMITER) {
            return Err(Error::InvalidEntry(format!("question may not contain '{}'", KEY_DELIMITER)));
        }
        if question.starts_with('#') {
            return Err(Error::InvalidEntry("question may not start with '#'".into()));
        }
        Ok(())
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn match_order(&self) -> MatchOrder {
        self.match_order
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn learned_path(&self) -> &Path {
        &self.learned_path
    }
}
