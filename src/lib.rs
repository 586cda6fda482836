//! SRT Bank Assistant
//!
//! A demo banking service with a scripted conversational assistant:
//! - Customers log in and view balance, statement, cards, loans and branches
//! - The chat endpoint classifies each message into an intent and answers
//!   from a canned-response table, or runs a multi-turn flow
//! - Balance check and money transfer are multi-turn flows with per-session state
//! - Every chat turn is written to an interaction log
//! - The administrator edits training rows, retrains, and reads logs and analytics
//!
//! TURN:
//! SESSION STATE → (IDLE? CLASSIFY) → FLOW STEP → LEDGER? → LOG → REPLY

pub mod analytics;
pub mod api;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod ledger;
pub mod models;
pub mod responses;
pub mod sessions;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{Classification, IntentClassifier, Prediction};
pub use dialogue::{Assistant, DialogueState, TransferDraft};
