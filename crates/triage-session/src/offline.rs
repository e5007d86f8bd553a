//! Collaborators that need no network.
//!
//! Used by `--offline` runs and by tests: a keyword extractor driven by the
//! knowledge tables, a fixed general-advice recommender, and a client that
//! always reports the provider as unavailable.

use tracing::debug;

use triage_contracts::{
    error::{TriageError, TriageResult},
    history::MedicalHistory,
    llm::ChatRequest,
    state::Extraction,
};
use triage_core::traits::{LlmClient, Recommender, SymptomExtractor};
use triage_knowledge::KnowledgeBase;
use triage_llm::RECOMMENDATION_REMINDER;

/// Spots known symptom names and detail tags in free text.
///
/// A term matches when its words (underscores read as spaces) appear as a
/// whole phrase: `chest_pain` matches "my chest pain is worse".
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    terms: Vec<String>,
}

impl KeywordExtractor {
    /// Build the vocabulary from every symptom and detail the tables know.
    pub fn from_knowledge(knowledge: &KnowledgeBase) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for term in knowledge.known_symptoms().into_iter().chain(knowledge.known_details()) {
            if !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl SymptomExtractor for KeywordExtractor {
    fn extract(&self, text: &str, _client: &dyn LlmClient) -> Extraction {
        let haystack = padded_words(text);
        let found: Vec<String> = self
            .terms
            .iter()
            .filter(|term| haystack.contains(&format!(" {} ", term.replace('_', " "))))
            .cloned()
            .collect();

        debug!(count = found.len(), "keyword extraction complete");
        Extraction::from_symptoms(found)
    }
}

/// Lowercase words separated by single spaces, with a space at each end.
fn padded_words(text: &str) -> String {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

/// Fixed, general self-care advice.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedRecommender;

impl Recommender for CannedRecommender {
    fn recommend(
        &self,
        symptoms: &[String],
        history: &MedicalHistory,
        _client: &dyn LlmClient,
    ) -> TriageResult<String> {
        let about = if symptoms.is_empty() {
            "how you are feeling".to_string()
        } else {
            symptoms.join(", ").replace('_', " ")
        };

        let mut lines = vec![
            format!("- 🩺 Consult a healthcare professional about {}.", about),
            "- 💧 Rest and stay hydrated.".to_string(),
            "- 📝 Note when each symptom started and how it changes.".to_string(),
        ];
        if history.allergies.is_empty() {
            lines.push(
                "- 💊 Ask a pharmacist before taking over-the-counter medication.".to_string(),
            );
        } else {
            lines.push(format!(
                "- 💊 Ask a pharmacist before taking over-the-counter medication, \
                 mentioning your allergies ({}).",
                history.allergies_csv()
            ));
        }
        lines.push("- 📞 If symptoms suddenly get worse, contact a doctor promptly.".to_string());

        Ok(format!("{}\n\n{}", lines.join("\n"), RECOMMENDATION_REMINDER))
    }
}

/// A client with no provider behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClient;

impl LlmClient for OfflineClient {
    fn complete(&self, _request: &ChatRequest) -> TriageResult<String> {
        Err(TriageError::provider("offline mode: no language model is configured"))
    }
}
