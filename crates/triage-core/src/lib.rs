//! # triage-core
//!
//! The deterministic decision pipeline for symptom triage.
//!
//! This crate provides:
//! - The collaborator traits (`LlmClient`, `SymptomExtractor`, `Recommender`,
//!   `CompletenessAnalyzer`, `UrgencyClassifier`)
//! - The `TriageMachine` that sequences them into a bounded, four-transition turn
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triage_core::{TriageMachine, traits::{SymptomExtractor, Recommender}};
//!
//! let machine = TriageMachine::new(extractor, analyzer, classifier, recommender);
//! let result = machine.run(ConversationState::new(text, history), &client)?;
//! ```

pub mod machine;
pub mod traits;

pub use machine::{decide, PriorityPolicy, TriageMachine, TurnResult};
