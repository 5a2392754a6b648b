//! Question-answer table
//!
//! Keyword lookup over a flat file, extended at runtime when the bot is taught.

pub mod store;
pub mod transaction;

pub use store::{MatchOrder, QaEntry, QaStore, KEY_DELIMITER, VARIANT_DELIMITER};
pub use transaction::LearnTransaction;
