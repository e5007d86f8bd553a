//! Conversation state and pipeline step types.
//!
//! A `ConversationState` is created by the caller for each turn, threaded
//! through the pipeline stages as a value, and discarded once the filtered
//! response has been produced. Stages never mutate a state in place: each
//! returns a new value with additional fields set.

use serde::{Deserialize, Serialize};

use crate::{
    error::{TriageError, TriageResult},
    history::MedicalHistory,
};

/// Unique identifier for a single triage turn, carried in every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub uuid::Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Pipeline progress marker.
///
/// Steps form a fixed forward order:
///
/// ```text
/// Start → ProcessedInput → TriageAssessed → {Emergency | NeedsClarification | Recommended} → End
/// ```
///
/// A turn therefore takes at most four transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Start,
    ProcessedInput,
    TriageAssessed,
    Emergency,
    NeedsClarification,
    Recommended,
    End,
}

impl Step {
    /// The steps this step may legally advance to.
    pub fn successors(self) -> &'static [Step] {
        match self {
            Step::Start => &[Step::ProcessedInput],
            Step::ProcessedInput => &[Step::TriageAssessed],
            Step::TriageAssessed => &[Step::Emergency, Step::NeedsClarification, Step::Recommended],
            Step::Emergency | Step::NeedsClarification | Step::Recommended => &[Step::End],
            Step::End => &[],
        }
    }

    pub fn can_advance_to(self, next: Step) -> bool {
        self.successors().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::ProcessedInput => "processed_input",
            Step::TriageAssessed => "triage_assessed",
            Step::Emergency => "emergency",
            Step::NeedsClarification => "needs_clarification",
            Step::Recommended => "recommended",
            Step::End => "end",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a symptom extractor produced for one complaint.
///
/// "Nothing found" and "the provider could not be reached" are distinct
/// outcomes even though both leave the symptom list empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extraction {
    Detected { symptoms: Vec<String> },
    NoneDetected,
    ProviderUnavailable { reason: String },
}

impl Extraction {
    /// Classify a raw token list: empty means `NoneDetected`.
    pub fn from_symptoms(symptoms: Vec<String>) -> Self {
        if symptoms.is_empty() {
            Extraction::NoneDetected
        } else {
            Extraction::Detected { symptoms }
        }
    }

    /// Split into the symptom list and the status recorded on the state.
    pub fn into_parts(self) -> (Vec<String>, ExtractionStatus) {
        match self {
            Extraction::Detected { symptoms } => (symptoms, ExtractionStatus::Detected),
            Extraction::NoneDetected => (Vec::new(), ExtractionStatus::NoneDetected),
            Extraction::ProviderUnavailable { reason } => {
                (Vec::new(), ExtractionStatus::ProviderUnavailable { reason })
            }
        }
    }
}

/// The extraction outcome as recorded on a `ConversationState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStatus {
    #[default]
    NotRun,
    Detected,
    NoneDetected,
    ProviderUnavailable { reason: String },
}

/// The record threaded through every pipeline stage for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub turn_id: TurnId,
    /// Raw complaint text for this turn.
    pub user_input: String,
    /// Extracted symptom tokens, in extractor order. May be empty.
    pub symptoms: Vec<String>,
    pub medical_history: MedicalHistory,
    pub current_step: Step,
    pub extraction: ExtractionStatus,
    pub emergency_detected: bool,
    pub needs_clarification: bool,
    /// Unmet requirement tags. `None` means complete; never `Some(vec![])`.
    pub missing_symptoms: Option<Vec<String>>,
    /// Terminal human-readable output, set exactly once per turn.
    pub response: Option<String>,
    /// Reserved for localization. Not read by the decision logic.
    pub language: String,
    /// Reserved for severity tiers. Not populated by the decision logic.
    pub triage_level: Option<String>,
}

impl ConversationState {
    /// Create the initial state for a turn: all flags false, nothing extracted.
    pub fn new(user_input: impl Into<String>, medical_history: MedicalHistory) -> Self {
        Self {
            turn_id: TurnId::new(),
            user_input: user_input.into(),
            symptoms: Vec::new(),
            medical_history,
            current_step: Step::Start,
            extraction: ExtractionStatus::NotRun,
            emergency_detected: false,
            needs_clarification: false,
            missing_symptoms: None,
            response: None,
            language: "en".to_string(),
            triage_level: None,
        }
    }

    /// Return this state moved to `next`, rejecting any backward or skipping move.
    pub fn advanced(self, next: Step) -> TriageResult<Self> {
        if !self.current_step.can_advance_to(next) {
            return Err(TriageError::StateMachine {
                reason: format!(
                    "illegal transition from '{}' to '{}'",
                    self.current_step, next
                ),
            });
        }
        Ok(Self { current_step: next, ..self })
    }

    /// Return this state with the terminal response set.
    ///
    /// Fails if a response was already recorded for the turn.
    pub fn with_response(self, response: impl Into<String>) -> TriageResult<Self> {
        if self.response.is_some() {
            return Err(TriageError::StateMachine {
                reason: format!("response already set at step '{}'", self.current_step),
            });
        }
        Ok(Self { response: Some(response.into()), ..self })
    }
}
