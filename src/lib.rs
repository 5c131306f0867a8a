//! Portfolio Q&A Gateway
//!
//! Answers natural-language questions about a wealth-management dataset:
//! - Client / portfolio questions are answered from a static roster
//! - Transaction questions are answered from a live MySQL store, first by a
//!   bounded tool-using SQL agent, then by a direct SQL pipeline
//!
//! REQUEST FLOW:
//! QUESTION → VALIDATE → CLASSIFY → DISPATCH → ANSWER + VISUALIZATION HINT

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod intent;
pub mod llm;
pub mod models;
pub mod portfolio;
pub mod responder;
pub mod sql;
pub mod tools;
pub mod transaction;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{ClassifierVocabulary, IntentClassifier};
pub use config::Settings;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use responder::DomainResponder;
