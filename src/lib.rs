//! Teachbot - keyword question-answering bot that learns
//!
//! A single-user bot with:
//! - A flat-file keyword table of answers (first matching key wins)
//! - A learning mode that asks for, stores and then uses unknown answers
//! - Personality styles that change how answers are delivered
//! - An append-only conversation history and persisted usage counters
//!
//! # Example
//!
//! ```ignore
//! use teachbot::{AnswerResult, ConversationEngine, EngineOptions, StoragePaths};
//!
//! fn main() -> teachbot::Result<()> {
//!     let paths = StoragePaths::in_dir(std::path::Path::new("data"));
//!     let mut engine = ConversationEngine::open(&paths, EngineOptions::default())?;
//!
//!     match engine.submit("o que e juros?", "formal")? {
//!         AnswerResult::Answered { text, .. } => println!("{}", text),
//!         AnswerResult::NeedsTeaching { .. } => {
//!             let taught = engine.provide_answer("Juros sao o custo do dinheiro.")?;
//!             println!("{}", taught.text().unwrap_or_default());
//!         }
//!         AnswerResult::FinishTeachingFirst { .. } => {}
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod types;
pub mod error;
pub mod storage;
pub mod qa;
pub mod history;
pub mod personality;
pub mod engine;
pub mod config;

// Outer surfaces
pub mod report;
pub mod cli;

// Re-export commonly used types for convenience
pub use types::{AnswerResult, ConversationEntry};

pub use error::{Error, Result, WriteStep};

pub use qa::{MatchOrder, QaEntry, QaStore};

pub use history::HistoryLedger;

pub use personality::{CorruptionPolicy, Personality, PersonalityCounter, PersonalityCounters};

pub use engine::{ConversationEngine, EngineOptions, EngineState, SharedEngine, VariantSelection};

pub use config::{Config, StoragePaths};

pub use report::SessionStats;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Question-answering bot that learns", NAME, VERSION)
}
