//! # triage-knowledge
//!
//! TOML-driven symptom tables for the triage pipeline.
//!
//! ## Overview
//!
//! This crate provides [`KnowledgeBase`], which implements both
//! [`CompletenessAnalyzer`](triage_core::traits::CompletenessAnalyzer) and
//! [`UrgencyClassifier`](triage_core::traits::UrgencyClassifier). The tables
//! are declared in TOML; a default set is compiled in from
//! `knowledge/default.toml`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_knowledge::KnowledgeBase;
//!
//! let kb = Arc::new(KnowledgeBase::builtin());
//! // Pass `kb.clone()` as both analyzer and classifier to `TriageMachine::new(...)`.
//! ```
//!
//! ## Matching
//!
//! Symptom names match input tokens exactly. Detail tags are satisfied by any
//! input token that contains the tag as a substring, so `"fever_duration_3_days"`
//! satisfies the `duration` detail of every symptom that requires it.

pub mod base;
pub mod table;

pub use base::{KnowledgeBase, BUILTIN_KNOWLEDGE};
pub use table::{DetailRequirement, KnowledgeConfig, SymptomEntry};

// ── Tests ─────────────────────────────────────────────────────────────────────
