//! Plain data passed between the stores, the engine and the CLI

use serde::{Deserialize, Serialize};

/// A single completed interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
}

impl ConversationEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Render as a ledger record: `USER: q\nBOT: a\n---\n`
    ///
    /// Both fields are flattened to one line so a record is always exactly
    /// three lines.
    pub fn to_record(&self) -> String {
        format!(
            "USER: {}\nBOT: {}\n---\n",
            flatten_line(&self.question),
            flatten_line(&self.answer)
        )
    }
}

/// Outcome of `submit` / `provide_answer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerResult {
    /// The bot answered, either from the store or from a just-taught answer
    Answered { text: String, learned: bool },
    /// No stored key matched; the engine waits for `provide_answer`
    NeedsTeaching { question: String },
    /// A question is already waiting to be taught; nothing was changed
    FinishTeachingFirst { pending: String },
}

impl AnswerResult {
    /// Whether the result carries an answer
    pub fn matched(&self) -> bool {
        matches!(self, AnswerResult::Answered { .. })
    }

    /// The rendered answer, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            AnswerResult::Answered { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Collapse a possibly multi-line string into a single trimmed line.
///
/// Every whitespace run is replaced by one space.
pub fn flatten_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
