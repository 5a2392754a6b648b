//! Conversation history

pub mod ledger;

pub use ledger::{parse_records, HistoryLedger};
