//! Configuration management
//!
//! Manages where the bot keeps its files and how it matches, picks and
//! recovers answers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{EngineOptions, VariantSelection};
use crate::personality::{CorruptionPolicy, Personality};
use crate::qa::MatchOrder;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Matching and recovery behavior
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the data files (defaults to the platform data dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_qa_file")]
    pub qa_file: String,
    #[serde(default = "default_history_file")]
    pub history_file: String,
    #[serde(default = "default_learned_file")]
    pub learned_file: String,
    #[serde(default = "default_counters_file")]
    pub counters_file: String,
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
}

fn default_qa_file() -> String {
    "qa_dict.txt".to_string()
}

fn default_history_file() -> String {
    "history.txt".to_string()
}

fn default_learned_file() -> String {
    "learned.txt".to_string()
}

fn default_counters_file() -> String {
    "counters.json".to_string()
}

fn default_summary_file() -> String {
    "summary.txt".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            qa_file: default_qa_file(),
            history_file: default_history_file(),
            learned_file: default_learned_file(),
            counters_file: default_counters_file(),
            summary_file: default_summary_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Which of several matching keys wins
    #[serde(default)]
    pub match_order: MatchOrder,
    /// How one of several answer variants is picked
    #[serde(default)]
    pub variant_selection: VariantSelection,
    /// Reset or report a corrupt counter file
    #[serde(default)]
    pub corruption_policy: CorruptionPolicy,
    /// Personality used when none is given
    #[serde(default)]
    pub default_personality: Personality,
    /// Number of interactions shown by `history` without `-n`
    #[serde(default = "default_history_tail")]
    pub history_tail: usize,
}

fn default_history_tail() -> usize {
    5
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            match_order: MatchOrder::default(),
            variant_selection: VariantSelection::default(),
            corruption_policy: CorruptionPolicy::default(),
            default_personality: Personality::default(),
            history_tail: default_history_tail(),
        }
    }
}

/// Resolved locations of every data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub qa: PathBuf,
    pub history: PathBuf,
    pub learned: PathBuf,
    pub counters: PathBuf,
    pub summary: PathBuf,
}

impl StoragePaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        StorageConfig::default().resolve(dir)
    }
}

impl StorageConfig {
    /// Join the configured file names onto `dir`
    pub fn resolve(&self, dir: &Path) -> StoragePaths {
        StoragePaths {
            qa: dir.join(&self.qa_file),
            history: dir.join(&self.history_file),
            learned: dir.join(&self.learned_file),
            counters: dir.join(&self.counters_file),
            summary: dir.join(&self.summary_file),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Resolve data file paths, preferring `override_dir` when given
    pub fn storage_paths(&self, override_dir: Option<&Path>) -> Result<StoragePaths> {
        let dir = match (override_dir, &self.storage.data_dir) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => dir.clone(),
            (None, None) => data_dir()?,
        };
        Ok(self.storage.resolve(&dir))
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            match_order: self.behavior.match_order,
            variant_selection: self.behavior.variant_selection,
            corruption_policy: self.behavior.corruption_policy,
        }
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "teachbot", "teachbot")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "teachbot", "teachbot")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.behavior.history_tail, 5);
        assert_eq!(config.storage.counters_file, "counters.json");
    }

    #[test]
    fn test_partial_behavior_section() {
        let config: Config = toml::from_str(
            "[behavior]\nmatch_order = \"most_recent\"\ncorruption_policy = \"surface\"\ndefault_personality = \"engracado\"\n",
        )
        .unwrap();
        assert_eq!(config.behavior.match_order, MatchOrder::MostRecent);
        assert_eq!(config.behavior.corruption_policy, CorruptionPolicy::Surface);
        assert_eq!(config.behavior.default_personality, Personality::Humorous);
        assert_eq!(config.behavior.variant_selection, VariantSelection::Random);

        let options = config.engine_options();
        assert_eq!(options.match_order, MatchOrder::MostRecent);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().join("data"));
        config.behavior.variant_selection = VariantSelection::First;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_storage_paths_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().join("configured"));
        config.storage.qa_file = "answers.txt".into();

        let paths = config.storage_paths(None).unwrap();
        assert_eq!(paths.qa, dir.path().join("configured").join("answers.txt"));

        let paths = config.storage_paths(Some(&dir.path().join("override"))).unwrap();
        assert_eq!(paths.history, dir.path().join("override").join("history.txt"));
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config: Config = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(config, Config::default());
    }
}
