//! Requirement and knowledge table schema.
//!
//! A `KnowledgeConfig` is deserialized from TOML and holds two ordered
//! tables: the symptom-detail requirements checked by the Completeness
//! Analyzer and the urgency entries read by the Urgency Classifier.

use serde::{Deserialize, Serialize};

use triage_contracts::outcome::Urgency;

/// One row of the symptom-detail requirement table.
///
/// Example in TOML:
/// ```toml
/// [[requirements]]
/// symptom = "headache"
/// details = ["onset", "frequency", "associated_nausea"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRequirement {
    /// Exact symptom token this row applies to.
    pub symptom: String,

    /// Detail tags the symptom requires, in reporting order.
    pub details: Vec<String>,
}

/// One row of the urgency knowledge table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
    /// Exact symptom token this row applies to.
    pub name: String,

    /// Urgency level. Rows that omit it are `medium`.
    #[serde(default)]
    pub urgency: Urgency,

    /// Conditions commonly associated with the symptom. Informational only.
    #[serde(default)]
    pub related_conditions: Vec<String>,
}

/// The top-level structure deserialized from a knowledge TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Ordered requirement rows. Table order drives output order.
    #[serde(default)]
    pub requirements: Vec<DetailRequirement>,

    /// Urgency rows. Order does not matter.
    #[serde(default)]
    pub symptoms: Vec<SymptomEntry>,
}
