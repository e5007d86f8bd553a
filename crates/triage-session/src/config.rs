//! Application configuration shared by both front-ends.
//!
//! ```toml
//! [llm]
//! model = "gemma2-9b-it"
//! timeout_secs = 30
//!
//! [triage]
//! priority = "clarification_first"   # or "urgency_first"
//! knowledge = "knowledge/custom.toml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use triage_contracts::error::{TriageError, TriageResult};
use triage_core::PriorityPolicy;
use triage_llm::LlmConfig;

/// Serializable mirror of [`PriorityPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrioritySetting {
    #[default]
    ClarificationFirst,
    UrgencyFirst,
}

impl From<PrioritySetting> for PriorityPolicy {
    fn from(setting: PrioritySetting) -> Self {
        match setting {
            PrioritySetting::ClarificationFirst => PriorityPolicy::ClarificationFirst,
            PrioritySetting::UrgencyFirst => PriorityPolicy::UrgencyFirst,
        }
    }
}

/// The `[triage]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageSettings {
    pub priority: PrioritySetting,
    /// Knowledge tables to load instead of the compiled-in defaults.
    pub knowledge: Option<PathBuf>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub triage: TriageSettings,
}

impl AppConfig {
    /// # Errors
    ///
    /// `TriageError::Config` if the TOML is malformed or has unknown values.
    pub fn from_toml_str(s: &str) -> TriageResult<Self> {
        toml::from_str(s).map_err(|e| TriageError::Config {
            reason: format!("failed to parse configuration TOML: {}", e),
        })
    }

    /// # Errors
    ///
    /// `TriageError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> TriageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TriageError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, else defaults, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> TriageResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.llm = self.llm.with_env_overrides();
        self
    }

    pub fn priority_policy(&self) -> PriorityPolicy {
        self.triage.priority.into()
    }
}
