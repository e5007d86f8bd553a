//! Caller-supplied medical history.
//!
//! The core keeps no memory between turns: every turn receives the history
//! from the front-end that owns the session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Allergies and pre-existing conditions reported by the user.
///
/// Both are sets; `BTreeSet` keeps prompt rendering and display deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub allergies: BTreeSet<String>,
    pub conditions: BTreeSet<String>,
}

impl MedicalHistory {
    /// Build a history from the two comma-separated text fields the
    /// front-ends collect. Entries are trimmed and blanks are dropped.
    pub fn from_comma_separated(allergies: &str, conditions: &str) -> Self {
        Self {
            allergies: split_list(allergies),
            conditions: split_list(conditions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allergies.is_empty() && self.conditions.is_empty()
    }

    /// Render allergies as the comma-separated form used in input fields.
    pub fn allergies_csv(&self) -> String {
        join(&self.allergies)
    }

    /// Render conditions as the comma-separated form used in input fields.
    pub fn conditions_csv(&self) -> String {
        join(&self.conditions)
    }
}

fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
