//! The loaded knowledge base: Completeness Analyzer and Urgency Classifier.
//!
//! `KnowledgeBase` loads a `KnowledgeConfig` from a TOML string or file and
//! implements `CompletenessAnalyzer` and `UrgencyClassifier` from triage-core.
//!
//! Completeness algorithm:
//!
//! 1. Iterate requirement rows in table order.
//! 2. Skip rows whose symptom is not an exact token in the input.
//! 3. For each detail tag of the row, in order, the detail is satisfied when
//!    ANY input token contains the tag as a substring; otherwise
//!    `"<symptom>_<detail>"` is appended to the missing list.
//! 4. An empty missing list is reported as `None`.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use triage_contracts::{
    error::{TriageError, TriageResult},
    outcome::{Urgency, UrgencyClass},
};
use triage_core::traits::{CompletenessAnalyzer, UrgencyClassifier};

use crate::table::{DetailRequirement, KnowledgeConfig, SymptomEntry};

/// The knowledge tables compiled into the binary.
pub const BUILTIN_KNOWLEDGE: &str = include_str!("../knowledge/default.toml");

/// Read-only symptom tables shared by every turn in the process.
///
/// ```rust,ignore
/// use triage_knowledge::KnowledgeBase;
///
/// let kb = KnowledgeBase::from_file(Path::new("knowledge/custom.toml"))?;
/// assert_eq!(kb.analyze_symptoms(&["headache".into()]).unwrap().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    config: KnowledgeConfig,
}

impl KnowledgeBase {
    /// Parse `s` as TOML and build a `KnowledgeBase`.
    ///
    /// Returns `TriageError::Config` if the TOML is malformed, does not match
    /// `KnowledgeConfig`, or lists the same requirement symptom twice.
    pub fn from_toml_str(s: &str) -> TriageResult<Self> {
        let config: KnowledgeConfig = toml::from_str(s).map_err(|e| TriageError::Config {
            reason: format!("failed to parse knowledge TOML: {}", e),
        })?;
        Self::from_config(config)
    }

    /// Read the file at `path` and parse it as knowledge TOML.
    pub fn from_file(path: &Path) -> TriageResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TriageError::Config {
            reason: format!("failed to read knowledge file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validate and wrap an already-deserialized config.
    pub fn from_config(config: KnowledgeConfig) -> TriageResult<Self> {
        for (idx, row) in config.requirements.iter().enumerate() {
            if row.symptom.trim().is_empty() {
                return Err(TriageError::config(format!(
                    "requirement row {} has an empty symptom name",
                    idx
                )));
            }
            if config.requirements[..idx].iter().any(|r| r.symptom == row.symptom) {
                return Err(TriageError::config(format!(
                    "symptom '{}' appears twice in the requirement table",
                    row.symptom
                )));
            }
        }
        if let Some(entry) = config.symptoms.iter().find(|e| e.name.trim().is_empty()) {
            return Err(TriageError::config(format!(
                "knowledge entry with urgency '{:?}' has an empty name",
                entry.urgency
            )));
        }
        Ok(Self { config })
    }

    /// The built-in tables.
    ///
    /// # Panics
    ///
    /// Panics if `BUILTIN_KNOWLEDGE` does not parse, which the crate's tests rule out.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_KNOWLEDGE).expect("built-in knowledge tables must parse")
    }

    pub fn requirements(&self) -> &[DetailRequirement] {
        &self.config.requirements
    }

    pub fn entries(&self) -> &[SymptomEntry] {
        &self.config.symptoms
    }

    /// Every symptom name either table knows about, requirement rows first,
    /// without duplicates.
    pub fn known_symptoms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .config
            .requirements
            .iter()
            .map(|r| r.symptom.as_str())
            .chain(self.config.symptoms.iter().map(|e| e.name.as_str()));
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Every detail tag any requirement row mentions, in table order.
    pub fn known_details(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for detail in self.config.requirements.iter().flat_map(|r| r.details.iter()) {
            if !tags.contains(&detail.as_str()) {
                tags.push(detail.as_str());
            }
        }
        tags
    }

    /// Urgency of a single symptom, or `None` when the table has no entry.
    pub fn urgency_of(&self, symptom: &str) -> Option<Urgency> {
        self.entry(symptom).map(|e| e.urgency)
    }

    /// Conditions associated with a symptom; empty for unknown symptoms.
    pub fn related_conditions(&self, symptom: &str) -> &[String] {
        self.entry(symptom)
            .map(|e| e.related_conditions.as_slice())
            .unwrap_or(&[])
    }

    fn entry(&self, symptom: &str) -> Option<&SymptomEntry> {
        self.config.symptoms.iter().find(|e| e.name == symptom)
    }

    /// Return the ordered missing-detail tags for `symptoms`, or `None`.
    pub fn analyze_symptoms(&self, symptoms: &[String]) -> Option<Vec<String>> {
        info!(symptom_count = symptoms.len(), "analyzing symptom completeness");

        let mut missing = Vec::new();
        for row in &self.config.requirements {
            if !symptoms.iter().any(|s| *s == row.symptom) {
                continue;
            }
            debug!(symptom = %row.symptom, "checking required details");

            for detail in &row.details {
                let satisfied = symptoms.iter().any(|s| s.contains(detail.as_str()));
                if !satisfied {
                    let tag = format!("{}_{}", row.symptom, detail);
                    debug!(missing = %tag, "missing detail found");
                    missing.push(tag);
                }
            }
        }

        info!(missing_count = missing.len(), "completeness analysis complete");
        if missing.is_empty() {
            None
        } else {
            Some(missing)
        }
    }

    /// Analyze an untyped symptom payload, e.g. a JSON array from a caller.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Analysis` when `value` is not an array. Entries
    /// that are not strings are skipped with a warning.
    pub fn analyze_value(&self, value: &Value) -> TriageResult<Option<Vec<String>>> {
        let items = value.as_array().ok_or_else(|| TriageError::Analysis {
            reason: format!("symptoms must be an array, got {}", json_kind(value)),
        })?;

        let symptoms: Vec<String> = items
            .iter()
            .filter_map(|item| match item.as_str() {
                Some(s) => Some(s.to_string()),
                None => {
                    warn!(entry = %item, "non-string symptom skipped");
                    None
                }
            })
            .collect();

        Ok(self.analyze_symptoms(&symptoms))
    }

    /// `Emergency` when any known symptom has `high` urgency.
    pub fn classify_symptoms(&self, symptoms: &[String]) -> UrgencyClass {
        let high = symptoms
            .iter()
            .filter_map(|s| self.urgency_of(s))
            .any(|u| u == Urgency::High);

        let class = if high { UrgencyClass::Emergency } else { UrgencyClass::NonEmergency };
        debug!(symptom_count = symptoms.len(), class = ?class, "urgency classified");
        class
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CompletenessAnalyzer for KnowledgeBase {
    fn analyze(&self, symptoms: &[String]) -> TriageResult<Option<Vec<String>>> {
        Ok(self.analyze_symptoms(symptoms))
    }
}

impl UrgencyClassifier for KnowledgeBase {
    fn classify(&self, symptoms: &[String]) -> UrgencyClass {
        self.classify_symptoms(symptoms)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
