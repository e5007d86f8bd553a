//! In-memory chat session: history plus a timestamped transcript.
//!
//! Nothing here outlives the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use triage_contracts::history::MedicalHistory;

use crate::{runtime::TriageRuntime, turn::TurnReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "You"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl TranscriptEntry {
    fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// One user's conversation. Turns are independent; only the history and the
/// transcript carry over.
pub struct TriageSession {
    runtime: Arc<TriageRuntime>,
    history: MedicalHistory,
    transcript: Vec<TranscriptEntry>,
}

impl TriageSession {
    pub fn new(runtime: Arc<TriageRuntime>) -> Self {
        Self {
            runtime,
            history: MedicalHistory::default(),
            transcript: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: MedicalHistory) -> Self {
        self.history = history;
        self
    }

    pub fn history(&self) -> &MedicalHistory {
        &self.history
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Replace the history from the two comma-separated fields.
    pub fn update_history(&mut self, allergies: &str, conditions: &str) {
        self.history = MedicalHistory::from_comma_separated(allergies, conditions);
        debug!(
            allergies = self.history.allergies.len(),
            conditions = self.history.conditions.len(),
            "medical history updated"
        );
    }

    /// Run a turn, record both sides, and return the report.
    pub fn submit(&mut self, user_input: &str) -> TurnReport {
        self.transcript.push(TranscriptEntry::now(Role::User, user_input));
        let report = self.runtime.run_turn_report(user_input, &self.history);
        self.transcript
            .push(TranscriptEntry::now(Role::Assistant, report.response.clone()));
        report
    }

    /// Drop the transcript. The history is kept.
    pub fn clear(&mut self) {
        debug!(entries = self.transcript.len(), "conversation cleared");
        self.transcript.clear();
    }
}
