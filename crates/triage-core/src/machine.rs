//! The triage state machine: the deterministic turn runner.
//!
//! The machine enforces the triage execution model:
//!
//!   Start → ProcessedInput → TriageAssessed → {Emergency | NeedsClarification | Recommended} → End
//!
//! Every stage is a function from a `ConversationState` value to a new one.
//! Branch selection is a single pure function, `decide`, over the assessed
//! state. The `Emergency` terminal never touches the network: the alert must
//! be deliverable even when the provider is down.

use std::sync::Arc;

use tracing::{debug, info, warn};

use triage_contracts::{
    error::{TriageError, TriageResult},
    outcome::{TriageBranch, TriageOutcome},
    state::{ConversationState, ExtractionStatus, Step},
};

use crate::traits::{
    CompletenessAnalyzer, LlmClient, Recommender, SymptomExtractor, UrgencyClassifier,
};

/// Fixed alert produced by the `Emergency` terminal node.
pub const EMERGENCY_MESSAGE: &str = "🚨 Please seek immediate medical attention!";

/// Which signal wins when a symptom is both high-urgency and incomplete.
///
/// `ClarificationFirst` is the established behaviour: completeness is checked
/// first and an incomplete turn skips urgency classification entirely.
/// `UrgencyFirst` classifies urgency regardless, so an emergency preempts the
/// clarification request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityPolicy {
    #[default]
    ClarificationFirst,
    UrgencyFirst,
}

/// The result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// The state after the `End` transition. `response` is always set.
    pub final_state: ConversationState,
    /// The tagged terminal outcome.
    pub outcome: TriageOutcome,
    /// Every step the turn visited, starting with `Start`.
    pub path: Vec<Step>,
}

/// Select the terminal branch for an assessed state.
///
/// Priority is fixed: emergency, then clarification, then recommendation.
pub fn decide(state: &ConversationState) -> TriageBranch {
    if state.emergency_detected {
        TriageBranch::Emergency
    } else if state.needs_clarification {
        TriageBranch::NeedsClarification
    } else {
        TriageBranch::Recommended
    }
}

/// Render the clarification request for the given missing tags, in order.
pub fn clarification_message(missing: &[String]) -> String {
    format!("Please clarify: {}?", missing.join(", "))
}

/// Sequences extraction, completeness, urgency, and recommendation for one turn.
///
/// The machine holds only shared, read-only collaborators, so one instance can
/// serve any number of independent turns. The LLM client is supplied per call.
pub struct TriageMachine {
    extractor: Arc<dyn SymptomExtractor>,
    analyzer: Arc<dyn CompletenessAnalyzer>,
    classifier: Arc<dyn UrgencyClassifier>,
    recommender: Arc<dyn Recommender>,
    policy: PriorityPolicy,
}

impl TriageMachine {
    /// Create a machine with the default `ClarificationFirst` policy.
    pub fn new(
        extractor: Arc<dyn SymptomExtractor>,
        analyzer: Arc<dyn CompletenessAnalyzer>,
        classifier: Arc<dyn UrgencyClassifier>,
        recommender: Arc<dyn Recommender>,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            classifier,
            recommender,
            policy: PriorityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PriorityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PriorityPolicy {
        self.policy
    }

    /// `Start → ProcessedInput`: validate the complaint and extract symptoms.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `user_input` is blank. Extractor failures
    /// are not errors; they leave the symptom list empty.
    pub fn process_input(
        &self,
        state: ConversationState,
        client: &dyn LlmClient,
    ) -> TriageResult<ConversationState> {
        if state.user_input.trim().is_empty() {
            return Err(TriageError::InvalidInput {
                reason: "user_input must be a non-empty string".to_string(),
            });
        }

        let (symptoms, extraction) = self.extractor.extract(&state.user_input, client).into_parts();

        if let ExtractionStatus::ProviderUnavailable { reason } = &extraction {
            warn!(
                turn_id = %state.turn_id,
                reason = %reason,
                "symptom extraction degraded to an empty list"
            );
        }
        debug!(
            turn_id = %state.turn_id,
            symptom_count = symptoms.len(),
            "input processed"
        );

        let state = state.advanced(Step::ProcessedInput)?;
        Ok(ConversationState { symptoms, extraction, ..state })
    }

    /// `ProcessedInput → TriageAssessed`: completeness, then urgency.
    ///
    /// Under `ClarificationFirst`, an incomplete symptom list sets
    /// `needs_clarification` and the classifier is never consulted.
    pub fn assess_triage(&self, state: ConversationState) -> TriageResult<ConversationState> {
        let missing = self
            .analyzer
            .analyze(&state.symptoms)?
            .filter(|missing| !missing.is_empty());

        let state = state.advanced(Step::TriageAssessed)?;

        let emergency_detected = match (&missing, self.policy) {
            (Some(_), PriorityPolicy::ClarificationFirst) => false,
            _ => self.classifier.classify(&state.symptoms).is_emergency(),
        };

        debug!(
            turn_id = %state.turn_id,
            missing_count = missing.as_ref().map_or(0, Vec::len),
            emergency_detected,
            "triage assessed"
        );

        Ok(ConversationState {
            needs_clarification: missing.is_some(),
            missing_symptoms: missing,
            emergency_detected,
            ..state
        })
    }

    /// `TriageAssessed → Emergency`. No external calls.
    pub fn handle_emergency(
        &self,
        state: ConversationState,
    ) -> TriageResult<(ConversationState, TriageOutcome)> {
        let state = state.advanced(Step::Emergency)?.with_response(EMERGENCY_MESSAGE)?;
        Ok((
            state,
            TriageOutcome::Emergency { message: EMERGENCY_MESSAGE.to_string() },
        ))
    }

    /// `TriageAssessed → NeedsClarification`.
    pub fn clarify_symptoms(
        &self,
        state: ConversationState,
    ) -> TriageResult<(ConversationState, TriageOutcome)> {
        let missing = match &state.missing_symptoms {
            Some(missing) => missing.clone(),
            None => {
                return Err(TriageError::StateMachine {
                    reason: "clarification requested without missing details".to_string(),
                })
            }
        };
        let message = clarification_message(&missing);
        let state = state.advanced(Step::NeedsClarification)?.with_response(message.clone())?;
        Ok((state, TriageOutcome::NeedsClarification { missing, message }))
    }

    /// `TriageAssessed → Recommended`.
    ///
    /// A recommender failure is caught here and becomes the response text.
    pub fn provide_recommendations(
        &self,
        state: ConversationState,
        client: &dyn LlmClient,
    ) -> TriageResult<(ConversationState, TriageOutcome)> {
        let (text, provider_failed) =
            match self.recommender.recommend(&state.symptoms, &state.medical_history, client) {
                Ok(text) => (text, false),
                Err(e) => {
                    warn!(turn_id = %state.turn_id, error = %e, "recommender failed");
                    (format!("Recommendation error: {}", e), true)
                }
            };
        let state = state.advanced(Step::Recommended)?.with_response(text.clone())?;
        Ok((state, TriageOutcome::Recommended { text, provider_failed }))
    }

    /// Run one complete turn from `Start` to `End`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank complaint, `Analysis` if the analyzer rejects
    /// its input, `StateMachine` if a stage attempts an illegal transition.
    /// Recommender failures are not errors.
    pub fn run(
        &self,
        state: ConversationState,
        client: &dyn LlmClient,
    ) -> TriageResult<TurnResult> {
        let turn_id = state.turn_id;
        let mut path = vec![state.current_step];

        let state = self.process_input(state, client)?;
        path.push(state.current_step);

        let state = self.assess_triage(state)?;
        path.push(state.current_step);

        let branch = decide(&state);
        let (state, outcome) = match branch {
            TriageBranch::Emergency => self.handle_emergency(state)?,
            TriageBranch::NeedsClarification => self.clarify_symptoms(state)?,
            TriageBranch::Recommended => self.provide_recommendations(state, client)?,
        };
        path.push(state.current_step);

        let final_state = state.advanced(Step::End)?;
        path.push(final_state.current_step);

        if final_state.response.is_none() {
            return Err(TriageError::StateMachine {
                reason: "turn ended without a response".to_string(),
            });
        }

        info!(
            turn_id = %turn_id,
            branch = ?branch,
            transitions = path.len() - 1,
            "turn complete"
        );

        Ok(TurnResult { final_state, outcome, path })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
