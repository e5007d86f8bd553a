//! LLM-backed symptom extraction.

use tracing::{debug, warn};

use triage_contracts::{llm::ChatRequest, state::Extraction};
use triage_core::traits::{LlmClient, SymptomExtractor};

pub const EXTRACT_SYSTEM_PROMPT: &str =
    "Extract medical symptoms and return them as a comma-separated list.";

/// Replies that mean "nothing found" rather than a symptom named "none".
const EMPTY_MARKERS: &[&str] = &["none", "n/a", "no_symptoms", "no_symptoms_found"];

/// Asks the model for a comma-separated symptom list.
///
/// Never fails: provider errors become `Extraction::ProviderUnavailable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LlmSymptomExtractor;

impl LlmSymptomExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn request_for(text: &str) -> ChatRequest {
        ChatRequest::new(
            EXTRACT_SYSTEM_PROMPT,
            format!("Extract medical symptoms from: {}", text),
        )
    }
}

impl SymptomExtractor for LlmSymptomExtractor {
    fn extract(&self, text: &str, client: &dyn LlmClient) -> Extraction {
        match client.complete(&Self::request_for(text)) {
            Ok(reply) => {
                let symptoms = parse_symptom_list(&reply);
                debug!(count = symptoms.len(), "symptoms extracted");
                Extraction::from_symptoms(symptoms)
            }
            Err(e) => {
                warn!(error = %e, "symptom extraction degraded");
                Extraction::ProviderUnavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Split a comma-separated reply into normalized tokens.
///
/// Empty entries and "none"-style markers are dropped; duplicates keep their
/// first position.
pub fn parse_symptom_list(reply: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in reply.split([',', '\n']).filter_map(normalize_token) {
        if EMPTY_MARKERS.contains(&token.as_str()) || out.contains(&token) {
            continue;
        }
        out.push(token);
    }
    out
}

/// Lowercase snake_case form of one raw token, or `None` if nothing is left.
///
/// `"Chest Pain."` → `chest_pain`, `"- short-of-breath"` → `short_of_breath`.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•')
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '"' | '\'' | '`'));

    let mut token = String::with_capacity(trimmed.len());
    for c in trimmed.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '/' {
            token.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !token.ends_with('_') {
            token.push('_');
        }
    }

    let token = token.trim_matches('_');
    (!token.is_empty()).then(|| token.to_string())
}
