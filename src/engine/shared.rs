//! Engine handle for async hosts
//!
//! The stores assume a single writer. When several tasks talk to the same
//! engine (a web handler, a chat bridge) every call goes through one lock so
//! multi-line ledger records and learn transactions never interleave.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::ConversationEngine;
use crate::error::Result;
use crate::personality::{Personality, PersonalityCounters};
use crate::types::{AnswerResult, ConversationEntry};

/// Cloneable, lock-guarded [`ConversationEngine`]
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<ConversationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: ConversationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub async fn submit(&self, question: &str, personality: Personality) -> Result<AnswerResult> {
        self.inner.lock().await.submit(question, personality)
    }

    pub async fn provide_answer(&self, answer: &str) -> Result<AnswerResult> {
        self.inner.lock().await.provide_answer(answer)
    }

    pub async fn cancel_teaching(&self) -> Option<String> {
        self.inner.lock().await.cancel_teaching()
    }

    pub async fn recent_history(&self, n: usize) -> Result<Vec<ConversationEntry>> {
        self.inner.lock().await.recent_history(n)
    }

    pub async fn current_counters(&self) -> PersonalityCounters {
        self.inner.lock().await.current_counters()
    }

    /// Run `f` with exclusive access to the engine
    pub async fn with<R>(&self, f: impl FnOnce(&mut ConversationEngine) -> R) -> R {
        let mut engine = self.inner.lock().await;
        f(&mut engine)
    }
}
