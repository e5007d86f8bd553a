//! Collaborator trait definitions for the triage pipeline.
//!
//! These traits are the seams between the deterministic state machine and
//! everything it does not own:
//!
//! - `LlmClient`: opaque language-model handle, passed explicitly
//! - `SymptomExtractor`: free text → symptom tokens (never fails)
//! - `Recommender`: symptoms + history → advice text (may fail)
//! - `CompletenessAnalyzer`: symptom tokens → missing detail tags
//! - `UrgencyClassifier`: symptom tokens → emergency / non-emergency
//!
//! All of them must be safe to share between concurrent turns.

use triage_contracts::{
    error::TriageResult,
    history::MedicalHistory,
    llm::ChatRequest,
    outcome::UrgencyClass,
    state::Extraction,
};

/// A handle to a chat-completion provider.
///
/// The machine never stores or mutates the client; it is handed to each
/// collaborator call that needs it.
pub trait LlmClient: Send + Sync {
    /// Send one system + user exchange and return the assistant text.
    fn complete(&self, request: &ChatRequest) -> TriageResult<String>;
}

/// Turns a complaint into symptom tokens.
pub trait SymptomExtractor: Send + Sync {
    /// Extract symptoms from `text`.
    ///
    /// Implementations MUST NOT fail: a provider outage is reported as
    /// `Extraction::ProviderUnavailable` so the turn can continue.
    fn extract(&self, text: &str, client: &dyn LlmClient) -> Extraction;
}

/// Produces general, non-diagnostic recommendations.
pub trait Recommender: Send + Sync {
    /// May fail on provider errors; the machine converts a failure into a
    /// response at the `Recommended` terminal node.
    fn recommend(
        &self,
        symptoms: &[String],
        history: &MedicalHistory,
        client: &dyn LlmClient,
    ) -> TriageResult<String>;
}

/// Checks that recognized symptoms carry the details they require.
pub trait CompletenessAnalyzer: Send + Sync {
    /// Return the ordered missing `"<symptom>_<detail>"` tags, or `None` when
    /// nothing is missing. An `Err` aborts the turn.
    fn analyze(&self, symptoms: &[String]) -> TriageResult<Option<Vec<String>>>;
}

/// Ranks a symptom list by the knowledge table's urgency levels.
pub trait UrgencyClassifier: Send + Sync {
    /// Unknown symptoms are ignored and never produce an error.
    fn classify(&self, symptoms: &[String]) -> UrgencyClass;
}
