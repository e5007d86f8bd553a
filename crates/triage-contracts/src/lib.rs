//! # triage-contracts
//!
//! Shared types and error contracts for the symptom triage pipeline.
//!
//! Every crate in the workspace imports from here. No decision logic lives in
//! this crate: only the conversation-state model, outcome types, and errors.

pub mod error;
pub mod history;
pub mod llm;
pub mod outcome;
pub mod state;
