//! Personality usage counters persisted as a small JSON record
//!
//! The record keeps the field names of the existing data files:
//! `{"formal": 0, "engracado": 0, "rude": 0}`. Every increment is saved
//! immediately so a crash never loses a count.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Personality;
use crate::error::{Error, Result, WriteStep};
use crate::storage;

/// What to do when a persisted record cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionPolicy {
    /// Log a warning and start from defaults
    #[default]
    Recover,
    /// Return `Error::MalformedRecord` to the caller
    Surface,
}

/// Usage count per counted personality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityCounters {
    #[serde(default)]
    pub formal: u64,
    #[serde(default, rename = "engracado", alias = "humorous")]
    pub humorous: u64,
    #[serde(default)]
    pub rude: u64,
}

impl PersonalityCounters {
    /// Count for a personality; `Neutral` is always 0
    pub fn get(&self, personality: Personality) -> u64 {
        match personality {
            Personality::Formal => self.formal,
            Personality::Humorous => self.humorous,
            Personality::Rude => self.rude,
            Personality::Neutral => 0,
        }
    }

    fn slot(&mut self, personality: Personality) -> Option<&mut u64> {
        match personality {
            Personality::Formal => Some(&mut self.formal),
            Personality::Humorous => Some(&mut self.humorous),
            Personality::Rude => Some(&mut self.rude),
            Personality::Neutral => None,
        }
    }

    /// All counted personalities with their counts
    pub fn iter(&self) -> impl Iterator<Item = (Personality, u64)> + '_ {
        Personality::COUNTED.into_iter().map(move |p| (p, self.get(p)))
    }

    pub fn total(&self) -> u64 {
        self.formal + self.humorous + self.rude
    }

    /// The most used personality; ties go to the earlier one in
    /// `Personality::COUNTED`. `None` when nothing has been counted yet.
    pub fn most_used(&self) -> Option<Personality> {
        let mut best: Option<(Personality, u64)> = None;
        for (p, count) in self.iter() {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((p, count));
            }
        }
        best.map(|(p, _)| p)
    }
}

/// File-backed personality usage counter
pub struct PersonalityCounter {
    path: PathBuf,
    counts: PersonalityCounters,
}

impl PersonalityCounter {
    /// Load the counter record at `path`.
    ///
    /// A missing file starts every count at 0. An unreadable or corrupt file
    /// is handled according to `policy`.
    pub fn load(path: impl Into<PathBuf>, policy: CorruptionPolicy) -> Result<Self> {
        let path = path.into();
        let counts = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<PersonalityCounters>(&content) {
                Ok(counts) => counts,
                Err(e) => Self::recover(&path, policy, Error::MalformedRecord {
                    path: path.clone(),
                    reason: e.to_string(),
                })?,
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PersonalityCounters::default(),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Self::recover(&path, policy, Error::MalformedRecord {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) => Self::recover(&path, policy, Error::load(&path, e))?,
        };

        debug!("Loaded personality counters from {}: {:?}", path.display(), counts);
        Ok(Self { path, counts })
    }

    fn recover(path: &Path, policy: CorruptionPolicy, err: Error) -> Result<PersonalityCounters> {
        match policy {
            CorruptionPolicy::Recover => {
                warn!("Resetting personality counters ({}): {}", path.display(), err);
                Ok(PersonalityCounters::default())
            }
            CorruptionPolicy::Surface => Err(err),
        }
    }

    /// Count one use of `personality` and save.
    ///
    /// `Neutral` is ignored. If the save fails the count is rolled back.
    pub fn increment(&mut self, personality: Personality) -> Result<()> {
        let Some(slot) = self.counts.slot(personality) else {
            return Ok(());
        };
        let previous = *slot;
        *slot = previous.saturating_add(1);

        if let Err(e) = self.save() {
            if let Some(slot) = self.counts.slot(personality) {
                *slot = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Write the full record through a temp file and rename
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.counts)
            .map_err(|e| Error::persistence(WriteStep::Counters, &self.path, std::io::Error::other(e)))?;

        storage::write_atomic(&self.path, &json)
            .map_err(|e| Error::persistence(WriteStep::Counters, &self.path, e))
    }

    /// Snapshot of the current counts
    pub fn counts(&self) -> PersonalityCounters {
        self.counts
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let counter = PersonalityCounter::load(dir.path().join("counters.json"), CorruptionPolicy::Recover).unwrap();
        assert_eq!(counter.counts(), PersonalityCounters::default());
        assert_eq!(counter.counts().most_used(), None);
    }

    #[test]
    fn test_increment_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        let mut counter = PersonalityCounter::load(&path, CorruptionPolicy::Recover).unwrap();
        counter.increment(Personality::Formal).unwrap();
        counter.increment(Personality::Humorous).unwrap();
        counter.increment(Personality::Humorous).unwrap();

        let reloaded = PersonalityCounter::load(&path, CorruptionPolicy::Surface).unwrap();
        assert_eq!(reloaded.counts().formal, 1);
        assert_eq!(reloaded.counts().humorous, 2);
        assert_eq!(reloaded.counts().rude, 0);
        assert_eq!(reloaded.counts().most_used(), Some(Personality::Humorous));
        assert!(!dir.path().join("counters.json.tmp").exists());
    }

    #[test]
    fn test_record_uses_legacy_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        let mut counter = PersonalityCounter::load(&path, CorruptionPolicy::Recover).unwrap();
        counter.increment(Personality::Humorous).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"formal\": 0,\n  \"engracado\": 1,\n  \"rude\": 0\n}");
    }

    #[test]
    fn test_neutral_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        let mut counter = PersonalityCounter::load(&path, CorruptionPolicy::Recover).unwrap();
        counter.increment(Personality::Rude).unwrap();
        let before = counter.counts();
        counter.increment(Personality::Neutral).unwrap();
        assert_eq!(counter.counts(), before);
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, r#"{"rude": 7}"#).unwrap();

        let counter = PersonalityCounter::load(&path, CorruptionPolicy::Surface).unwrap();
        assert_eq!(counter.counts().rude, 7);
        assert_eq!(counter.counts().formal, 0);
        assert_eq!(counter.counts().humorous, 0);
    }

    #[test]
    fn test_corrupt_record_recovers_or_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, "{ not json").unwrap();

        let counter = PersonalityCounter::load(&path, CorruptionPolicy::Recover).unwrap();
        assert_eq!(counter.counts().total(), 0);

        match PersonalityCounter::load(&path, CorruptionPolicy::Surface) {
            Err(Error::MalformedRecord { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected MalformedRecord, got {:?}", other.map(|c| c.counts())),
        }
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, b"{\"formal\": 1, \"rude\": \xff}").unwrap();

        assert!(matches!(
            PersonalityCounter::load(&path, CorruptionPolicy::Surface),
            Err(Error::MalformedRecord { .. })
        ));
        let counter = PersonalityCounter::load(&path, CorruptionPolicy::Recover).unwrap();
        assert_eq!(counter.counts().total(), 0);
    }

    #[test]
    fn test_negative_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        std::fs::write(&path, r#"{"formal": -1, "engracado": 0, "rude": 0}"#).unwrap();

        assert!(PersonalityCounter::load(&path, CorruptionPolicy::Surface).is_err());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the record should be makes the rename fail
        let path = dir.path().join("counters.json");
        std::fs::create_dir(&path).unwrap();

        let mut counter = PersonalityCounter {
            path: path.clone(),
            counts: PersonalityCounters::default(),
        };
        let err = counter.increment(Personality::Formal).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(counter.counts().formal, 0);
    }
}
