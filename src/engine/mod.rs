//! Conversation engine
//!
//! Ties the three stores together:
//!
//! - [`QaStore`] answers questions and learns new answers
//! - [`PersonalityCounter`] counts which styles were used
//! - [`HistoryLedger`] records every completed interaction
//!
//! The engine is a two-state machine. An unanswerable question moves it to
//! `AwaitingLearnedAnswer`; until `provide_answer` succeeds (or the teaching
//! is cancelled) every other question is turned away.

pub mod shared;

pub use shared::SharedEngine;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StoragePaths;
use crate::error::{Error, Result};
use crate::history::HistoryLedger;
use crate::personality::{CorruptionPolicy, Personality, PersonalityCounter, PersonalityCounters};
use crate::qa::{MatchOrder, QaStore};
use crate::types::{flatten_line, AnswerResult, ConversationEntry};

/// How to pick among several answer variants for one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantSelection {
    /// Uniformly at random
    #[default]
    Random,
    /// Always the first variant in the file
    First,
}

impl VariantSelection {
    fn pick<'a>(&self, variants: &'a [String]) -> Option<&'a String> {
        match self {
            VariantSelection::Random => variants.choose(&mut rand::rng()),
            VariantSelection::First => variants.first(),
        }
    }
}

/// Behavior switches for a [`ConversationEngine`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub match_order: MatchOrder,
    pub variant_selection: VariantSelection,
    pub corruption_policy: CorruptionPolicy,
}

/// Where the engine is in the ask/teach cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    AwaitingLearnedAnswer {
        question: String,
        personality: Personality,
    },
}

/// One conversation session over a set of stores
pub struct ConversationEngine {
    qa: QaStore,
    counter: PersonalityCounter,
    history: HistoryLedger,
    variant_selection: VariantSelection,
    state: EngineState,
}

impl ConversationEngine {
    /// Build an engine from already opened stores
    pub fn new(
        qa: QaStore,
        counter: PersonalityCounter,
        history: HistoryLedger,
        variant_selection: VariantSelection,
    ) -> Self {
        Self {
            qa,
            counter,
            history,
            variant_selection,
            state: EngineState::Idle,
        }
    }

    /// Open all stores at `paths`
    pub fn open(paths: &StoragePaths, options: EngineOptions) -> Result<Self> {
        let qa = QaStore::load(&paths.qa, &paths.learned, options.match_order)?;
        let counter = PersonalityCounter::load(&paths.counters, options.corruption_policy)?;
        let history = HistoryLedger::open(&paths.history);
        Ok(Self::new(qa, counter, history, options.variant_selection))
    }

    /// Ask a question.
    ///
    /// Returns `NeedsTeaching` when no key matches and `FinishTeachingFirst`
    /// while an earlier question is still waiting for its answer. Neither
    /// outcome writes anything. An unmatched question that could never be
    /// stored is rejected with `InvalidEntry` and the engine stays idle.
    pub fn submit(&mut self, question: &str, personality: impl Into<Personality>) -> Result<AnswerResult> {
        if let EngineState::AwaitingLearnedAnswer { question: pending, .. } = &self.state {
            debug!("Rejected question while '{}' awaits an answer", pending);
            return Ok(AnswerResult::FinishTeachingFirst { pending: pending.clone() });
        }

        let question = flatten_line(question);
        if question.is_empty() {
            return Err(Error::InvalidEntry("question is empty".into()));
        }
        let personality = personality.into();

        let variant = self
            .qa
            .find(&question)
            .and_then(|variants| self.variant_selection.pick(variants))
            .cloned();

        match variant {
            Some(base) => {
                let text = self.complete(&question, &base, personality)?;
                Ok(AnswerResult::Answered { text, learned: false })
            }
            None => {
                QaStore::check_question(&question)?;
                info!("No answer for '{}', waiting to be taught", question);
                self.state = EngineState::AwaitingLearnedAnswer {
                    question: question.clone(),
                    personality,
                };
                Ok(AnswerResult::NeedsTeaching { question })
            }
        }
    }

    /// Teach the answer for the pending question and deliver it.
    ///
    /// If the store cannot be written the engine keeps waiting, so the
    /// caller can retry with the same or another answer. Once the answer is
    /// stored the engine is idle again, even if counting or recording the
    /// delivered answer then fails.
    pub fn provide_answer(&mut self, answer: &str) -> Result<AnswerResult> {
        let (question, personality) = match &self.state {
            EngineState::AwaitingLearnedAnswer { question, personality } => (question.clone(), *personality),
            EngineState::Idle => return Err(Error::NoPendingQuestion),
        };

        let learned = self.qa.learn(&question, answer)?.variants[0].clone();
        self.state = EngineState::Idle;

        let text = self.complete(&question, &learned, personality)?;
        Ok(AnswerResult::Answered { text, learned: true })
    }

    /// Drop the pending question without teaching it
    pub fn cancel_teaching(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, EngineState::Idle) {
            EngineState::AwaitingLearnedAnswer { question, .. } => {
                debug!("Cancelled teaching for '{}'", question);
                Some(question)
            }
            EngineState::Idle => None,
        }
    }

    /// Render, count and record one answered question
    fn complete(&mut self, question: &str, base: &str, personality: Personality) -> Result<String> {
        let text = personality.render(base);
        self.counter.increment(personality)?;
        self.history.append(ConversationEntry::new(question, text.clone()))?;
        Ok(text)
    }

    /// The last `n` persisted interactions, oldest first
    pub fn recent_history(&self, n: usize) -> Result<Vec<ConversationEntry>> {
        self.history.tail(n)
    }

    pub fn current_counters(&self) -> PersonalityCounters {
        self.counter.counts()
    }

    /// Interactions completed by this engine
    pub fn session(&self) -> &[ConversationEntry] {
        self.history.session()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_awaiting_answer(&self) -> bool {
        matches!(self.state, EngineState::AwaitingLearnedAnswer { .. })
    }

    pub fn qa(&self) -> &QaStore {
        &self.qa
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    /// Persist anything still held only in memory
    pub fn flush(&mut self) -> Result<()> {
        self.history.flush_session()?;
        self.counter.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(qa: &str) -> (tempfile::TempDir, ConversationEngine) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("qa_dict.txt"), qa).unwrap();
        let paths = StoragePaths::in_dir(dir.path());
        let options = EngineOptions {
            variant_selection: VariantSelection::First,
            ..Default::default()
        };
        let engine = ConversationEngine::open(&paths, options).unwrap();
        (dir, engine)
    }

    #[test]
    fn test_matched_question_is_rendered_counted_and_recorded() {
        let (_dir, mut engine) = engine_with("juros|interest explanation\n");

        let result = engine.submit("O que e juros?", "formal").unwrap();
        assert_eq!(result, AnswerResult::Answered { text: "Dear, interest explanation".into(), learned: false });
        assert_eq!(engine.state(), &EngineState::Idle);
        assert_eq!(engine.current_counters().formal, 1);

        let recent = engine.recent_history(1).unwrap();
        assert_eq!(recent, vec![ConversationEntry::new("O que e juros?", "Dear, interest explanation")]);
        assert_eq!(engine.session().len(), 1);
    }

    #[test]
    fn test_unknown_personality_is_neutral_and_uncounted() {
        let (_dir, mut engine) = engine_with("juros|interest\n");

        let result = engine.submit("juros", "sarcastic").unwrap();
        assert_eq!(result.text(), Some("interest"));
        assert_eq!(engine.current_counters().total(), 0);
        assert_eq!(engine.recent_history(5).unwrap().len(), 1);
    }

    #[test]
    fn test_teaching_flow() {
        let (dir, mut engine) = engine_with("");

        let result = engine.submit("o que e um novo termo", Personality::Rude).unwrap();
        assert_eq!(result, AnswerResult::NeedsTeaching { question: "o que e um novo termo".into() });
        assert!(engine.is_awaiting_answer());
        assert_eq!(engine.current_counters().total(), 0);
        assert!(engine.recent_history(5).unwrap().is_empty());

        let result = engine.provide_answer("resposta x").unwrap();
        assert_eq!(result, AnswerResult::Answered { text: "Let's go: resposta x.".into(), learned: true });
        assert_eq!(engine.state(), &EngineState::Idle);
        assert_eq!(engine.current_counters().rude, 1);
        assert_eq!(engine.qa().find("o que e um novo termo de novo").unwrap(), ["resposta x"]);

        let learned = std::fs::read_to_string(dir.path().join("learned.txt")).unwrap();
        assert_eq!(learned, "o que e um novo termo|resposta x\n");
    }

    #[test]
    fn test_submit_while_teaching_changes_nothing() {
        let (dir, mut engine) = engine_with("juros|interest\n");
        engine.submit("pergunta desconhecida", "formal").unwrap();

        let before_qa = std::fs::read_to_string(dir.path().join("qa_dict.txt")).unwrap();
        let result = engine.submit("juros", "formal").unwrap();

        assert_eq!(result, AnswerResult::FinishTeachingFirst { pending: "pergunta desconhecida".into() });
        assert_eq!(engine.current_counters().total(), 0);
        assert!(engine.recent_history(5).unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(dir.path().join("qa_dict.txt")).unwrap(), before_qa);
        assert!(engine.is_awaiting_answer());
    }

    #[test]
    fn test_provide_answer_when_idle() {
        let (_dir, mut engine) = engine_with("");
        assert!(matches!(engine.provide_answer("x"), Err(Error::NoPendingQuestion)));
    }

    #[test]
    fn test_rejected_answer_keeps_question_pending() {
        let (_dir, mut engine) = engine_with("");
        engine.submit("novo", "formal").unwrap();

        assert!(matches!(engine.provide_answer("   "), Err(Error::InvalidEntry(_))));
        assert!(engine.is_awaiting_answer());

        engine.provide_answer("ok").unwrap();
        assert_eq!(engine.state(), &EngineState::Idle);
    }

    #[test]
    fn test_failed_learn_keeps_question_pending() {
        let (dir, mut engine) = engine_with("");
        engine.submit("novo termo", "formal").unwrap();

        // Replace the store file with a directory so the append fails
        let qa_path = dir.path().join("qa_dict.txt");
        std::fs::remove_file(&qa_path).unwrap();
        std::fs::create_dir(&qa_path).unwrap();

        let err = engine.provide_answer("resposta").unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(
            engine.state(),
            &EngineState::AwaitingLearnedAnswer { question: "novo termo".into(), personality: Personality::Formal }
        );
        assert_eq!(engine.current_counters().total(), 0);
        assert!(!dir.path().join("learned.txt").exists());

        // Once the store is writable again the same question can be taught
        std::fs::remove_dir(&qa_path).unwrap();
        let result = engine.provide_answer("resposta").unwrap();
        assert_eq!(result.text(), Some("Dear, resposta"));
    }

    #[test]
    fn test_unstorable_question_is_not_left_pending() {
        let (_dir, mut engine) = engine_with("juros|interest\n");

        for question in ["taxa a|b", "# tag"] {
            assert!(matches!(engine.submit(question, "formal"), Err(Error::InvalidEntry(_))));
            assert_eq!(engine.state(), &EngineState::Idle);
        }

        // A matching question is still answered even with the delimiter in it
        assert_eq!(engine.submit("juros|hoje", "neutral").unwrap().text(), Some("interest"));

        let result = engine.submit("taxa ab", "formal").unwrap();
        assert!(!result.matched());
        engine.provide_answer("x").unwrap();
        assert_eq!(engine.state(), &EngineState::Idle);
    }

    #[test]
    fn test_cancel_teaching() {
        let (_dir, mut engine) = engine_with("");
        assert_eq!(engine.cancel_teaching(), None);

        engine.submit("algo", "formal").unwrap();
        assert_eq!(engine.cancel_teaching(), Some("algo".into()));
        assert_eq!(engine.state(), &EngineState::Idle);
    }

    #[test]
    fn test_empty_question_rejected() {
        let (_dir, mut engine) = engine_with("");
        assert!(matches!(engine.submit("  \n ", "formal"), Err(Error::InvalidEntry(_))));
        assert_eq!(engine.state(), &EngineState::Idle);
    }

    #[test]
    fn test_counters_never_decrease() {
        let (_dir, mut engine) = engine_with("a|x\n");
        let mut last = engine.current_counters();
        for p in ["formal", "rude", "humorous", "unknown", "engracado", "formal"] {
            engine.submit("a", p).unwrap();
            let now = engine.current_counters();
            for personality in Personality::COUNTED {
                assert!(now.get(personality) >= last.get(personality));
            }
            last = now;
        }
        assert_eq!(last.formal, 2);
        assert_eq!(last.humorous, 2);
        assert_eq!(last.rude, 1);
    }

    #[test]
    fn test_random_selection_returns_a_stored_variant() {
        let variants = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        for _ in 0..20 {
            let picked = VariantSelection::Random.pick(&variants).unwrap();
            assert!(variants.contains(picked));
        }
        assert_eq!(VariantSelection::First.pick(&variants).unwrap(), "one");
        assert_eq!(VariantSelection::Random.pick(&[]), None);
    }
}
