//! Urgency levels, branch selection, and terminal outcomes.

use serde::{Deserialize, Serialize};

use crate::state::Step;

/// Urgency attached to a symptom in the knowledge table.
///
/// Entries that omit a level are treated as `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// Result of the Urgency Classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyClass {
    Emergency,
    NonEmergency,
}

impl UrgencyClass {
    pub fn is_emergency(self) -> bool {
        self == UrgencyClass::Emergency
    }
}

/// Which terminal node a turn is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageBranch {
    Emergency,
    NeedsClarification,
    Recommended,
}

impl TriageBranch {
    pub fn step(self) -> Step {
        match self {
            TriageBranch::Emergency => Step::Emergency,
            TriageBranch::NeedsClarification => Step::NeedsClarification,
            TriageBranch::Recommended => Step::Recommended,
        }
    }
}

/// How a turn ended. Exactly one variant is produced per completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriageOutcome {
    /// Fixed alert; produced without any external call.
    Emergency { message: String },
    /// Request for the listed missing details.
    NeedsClarification { missing: Vec<String>, message: String },
    /// Recommender text, or the description of a recommender failure.
    Recommended { text: String, provider_failed: bool },
}

impl TriageOutcome {
    pub fn branch(&self) -> TriageBranch {
        match self {
            TriageOutcome::Emergency { .. } => TriageBranch::Emergency,
            TriageOutcome::NeedsClarification { .. } => TriageBranch::NeedsClarification,
            TriageOutcome::Recommended { .. } => TriageBranch::Recommended,
        }
    }

    /// The unfiltered response text for this outcome.
    pub fn response(&self) -> &str {
        match self {
            TriageOutcome::Emergency { message } => message,
            TriageOutcome::NeedsClarification { message, .. } => message,
            TriageOutcome::Recommended { text, .. } => text,
        }
    }
}
