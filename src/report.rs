//! Session statistics and the summary report
//!
//! The report is plain text, sections separated by a blank line:
//! interaction count, most frequent question, accumulated personality
//! counters as JSON, and the latest persisted interactions. The two session
//! sections are left out when there is no live session to describe.

use std::path::Path;
use tracing::info;

use crate::engine::ConversationEngine;
use crate::error::{Error, Result, WriteStep};
use crate::personality::PersonalityCounters;
use crate::storage;
use crate::types::{flatten_line, ConversationEntry};

/// Number of persisted interactions included in a report
pub const REPORT_HISTORY_LEN: usize = 10;

/// Per-session question tally
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    interactions: usize,
    // First-seen order is kept so ties resolve to the earliest question
    questions: Vec<(String, usize)>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one submitted question
    pub fn record(&mut self, question: &str) {
        let question = flatten_line(question);
        if question.is_empty() {
            return;
        }
        self.interactions += 1;
        match self.questions.iter_mut().find(|(q, _)| *q == question) {
            Some((_, count)) => *count += 1,
            None => self.questions.push((question, 1)),
        }
    }

    pub fn interactions(&self) -> usize {
        self.interactions
    }

    /// Up to `k` questions, most asked first
    pub fn most_common(&self, k: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.questions.iter().map(|(q, c)| (q.as_str(), *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    pub fn most_frequent(&self) -> Option<&str> {
        self.most_common(1).first().map(|(q, _)| *q)
    }
}

/// Render the summary report text
pub fn render_report(
    stats: Option<&SessionStats>,
    counters: &PersonalityCounters,
    recent: &[ConversationEntry],
) -> String {
    let counters_json = serde_json::to_string_pretty(counters).unwrap_or_else(|_| "{}".to_string());

    let mut sections = Vec::new();
    if let Some(stats) = stats {
        sections.push(format!("Total interactions this session: {}", stats.interactions()));
        sections.push(format!(
            "Most frequent question this session: {}",
            stats.most_frequent().unwrap_or("")
        ));
    }
    sections.push("Accumulated personality counters:".to_string());
    sections.push(counters_json);
    sections.push("Latest interactions (persisted):".to_string());
    for entry in recent {
        sections.push(format!("Q: {}\nA: {}\n", entry.question, entry.answer));
    }
    sections.join("\n\n")
}

/// Build the report for `engine` and write it to `path`
pub fn write_report(engine: &ConversationEngine, stats: Option<&SessionStats>, path: &Path) -> Result<String> {
    let recent = engine.recent_history(REPORT_HISTORY_LEN)?;
    let text = render_report(stats, &engine.current_counters(), &recent);

    storage::write_atomic(path, &text).map_err(|e| Error::persistence(WriteStep::Report, path, e))?;
    info!("Wrote summary report to {}", path.display());
    Ok(text)
}
