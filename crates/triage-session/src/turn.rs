//! The single-turn entry point used by every front-end.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use triage_contracts::{
    history::MedicalHistory,
    outcome::TriageOutcome,
    state::{ConversationState, TurnId},
};
use triage_core::{traits::LlmClient, TriageMachine};
use triage_safety::SafetyFilter;

/// Shown when a turn completes with a blank response.
pub const NO_RESPONSE_FALLBACK: &str = "No response generated. Please try again.";

/// Everything a front-end may want to show about one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn_id: TurnId,
    /// The filtered text the user sees.
    pub response: String,
    /// `None` when the turn failed before reaching a terminal node.
    pub outcome: Option<TriageOutcome>,
    /// Symptom tokens the turn worked with.
    pub symptoms: Vec<String>,
    /// Emergency keywords the safety filter found in the raw response.
    pub safety_keywords: Vec<String>,
}

/// Run one turn and return the filtered response.
///
/// Never fails: a turn error becomes `"An error occurred: <message>"`, which
/// is filtered like any other response.
pub fn run_turn(
    machine: &TriageMachine,
    safety: &SafetyFilter,
    user_input: &str,
    history: &MedicalHistory,
    client: &dyn LlmClient,
) -> String {
    run_turn_report(machine, safety, user_input, history, client).response
}

/// [`run_turn`], keeping the outcome and filter details.
pub fn run_turn_report(
    machine: &TriageMachine,
    safety: &SafetyFilter,
    user_input: &str,
    history: &MedicalHistory,
    client: &dyn LlmClient,
) -> TurnReport {
    let state = ConversationState::new(user_input, history.clone());
    let turn_id = state.turn_id;

    let (raw, outcome, symptoms) = match machine.run(state, client) {
        Ok(result) => {
            let raw = result.final_state.response.unwrap_or_default();
            (raw, Some(result.outcome), result.final_state.symptoms)
        }
        Err(e) => {
            warn!(turn_id = %turn_id, error = %e, "turn failed");
            (format!("An error occurred: {}", e), None, Vec::new())
        }
    };

    let raw = if raw.trim().is_empty() {
        NO_RESPONSE_FALLBACK.to_string()
    } else {
        raw
    };

    let scan = safety.scan(&raw);
    let response = safety.filter(&raw);
    info!(
        turn_id = %turn_id,
        response_len = response.len(),
        safety_warning = scan.is_emergency(),
        "response delivered"
    );

    TurnReport {
        turn_id,
        response,
        outcome,
        symptoms,
        safety_keywords: scan.matched,
    }
}
