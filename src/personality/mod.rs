//! Personality styles
//!
//! A personality only changes *how* an answer is delivered, never which
//! answer is chosen. Usage of each style is tracked by [`PersonalityCounter`].

pub mod counter;

pub use counter::{CorruptionPolicy, PersonalityCounter, PersonalityCounters};

use serde::{Deserialize, Serialize};

/// Response style selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Formal,
    #[serde(alias = "engracado", alias = "funny")]
    Humorous,
    Rude,
    /// Fallback for anything unrecognized: no transform, never counted
    Neutral,
}

impl Personality {
    /// The styles that are rendered and counted
    pub const COUNTED: [Personality; 3] = [Personality::Formal, Personality::Humorous, Personality::Rude];

    /// Parse a user-supplied style name. Unknown names map to `Neutral`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "formal" => Personality::Formal,
            "humorous" | "engracado" | "funny" => Personality::Humorous,
            "rude" => Personality::Rude,
            _ => Personality::Neutral,
        }
    }

    /// Whether using this style increments a counter
    pub fn is_counted(&self) -> bool {
        !matches!(self, Personality::Neutral)
    }

    /// Apply the style to an answer
    pub fn render(&self, text: &str) -> String {
        match self {
            Personality::Formal => format!("Dear, {}", text),
            Personality::Humorous => format!("You dig? {} 😄", text),
            Personality::Rude => format!("Let's go: {}.", text),
            Personality::Neutral => text.to_string(),
        }
    }
}

impl From<&str> for Personality {
    fn from(name: &str) -> Self {
        Personality::parse(name)
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Personality::Formal => write!(f, "formal"),
            Personality::Humorous => write!(f, "humorous"),
            Personality::Rude => write!(f, "rude"),
            Personality::Neutral => write!(f, "neutral"),
        }
    }
}
