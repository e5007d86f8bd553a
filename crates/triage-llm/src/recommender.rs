//! LLM-backed recommendations.

use tracing::{debug, info};

use triage_contracts::{
    error::{TriageError, TriageResult},
    history::MedicalHistory,
    llm::ChatRequest,
};
use triage_core::traits::{LlmClient, Recommender};

pub const RECOMMEND_SYSTEM_PROMPT: &str =
    "You are a cautious medical assistant. Your responses must include:\n\
- 'Consult a healthcare professional' as first point\n\
- Clear disclaimer that this is not medical advice\n\
- Only WHO/CDC-approved recommendations";

/// Appended to every generated recommendation.
pub const RECOMMENDATION_REMINDER: &str =
    "⚠️ Remember: This is not medical advice. Always consult a doctor for proper evaluation.";

/// Asks the model for 3-5 general, non-diagnostic recommendations.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlmRecommender;

impl LlmRecommender {
    pub fn new() -> Self {
        Self
    }

    pub fn request_for(symptoms: &[String], history: &MedicalHistory) -> ChatRequest {
        let prompt = format!(
            "Given these symptoms: {} and medical history: {},\n\
             provide 3-5 general recommendations. Follow these rules:\n\
             1. Never diagnose conditions\n\
             2. Suggest only OTC medications as examples\n\
             3. Always recommend consulting a doctor\n\
             4. Prioritize safety over specificity\n\
             5. Include first aid measures if relevant\n\n\
             Format as markdown bullets with emojis:",
            symptoms.join(", "),
            describe_history(history),
        );
        ChatRequest::new(RECOMMEND_SYSTEM_PROMPT, prompt)
    }
}

impl Recommender for LlmRecommender {
    fn recommend(
        &self,
        symptoms: &[String],
        history: &MedicalHistory,
        client: &dyn LlmClient,
    ) -> TriageResult<String> {
        debug!(symptoms = symptoms.len(), "requesting recommendations");
        let text = client.complete(&Self::request_for(symptoms, history))?;
        if text.trim().is_empty() {
            return Err(TriageError::provider("recommendation was empty"));
        }
        info!("recommendations generated");
        Ok(format!("{}\n\n{}", text.trim_end(), RECOMMENDATION_REMINDER))
    }
}

fn describe_history(history: &MedicalHistory) -> String {
    if history.is_empty() {
        return "none reported".to_string();
    }
    let or_none = |s: String| if s.is_empty() { "none".to_string() } else { s };
    format!(
        "allergies: {}; conditions: {}",
        or_none(history.allergies_csv()),
        or_none(history.conditions_csv()),
    )
}
