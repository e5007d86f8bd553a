//! Connection settings for the chat-completion provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemma2-9b-it";

/// LLM provider configuration.
///
/// Deserializes from the `[llm]` table of the application config; every
/// field has a default so the table may be partial or absent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    /// Bearer token. Usually supplied through the environment, not the file.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure (timeout, connect, 429, 5xx).
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl LlmConfig {
    /// Overlay values from the process environment.
    ///
    /// `TRIAGE_API_KEY` wins over `GROQ_API_KEY`; `TRIAGE_MODEL` and
    /// `TRIAGE_ENDPOINT` replace the model and endpoint.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup. Blank values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("TRIAGE_API_KEY").or_else(|| get("GROQ_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(model) = get("TRIAGE_MODEL") {
            self.model = model;
        }
        if let Some(endpoint) = get("TRIAGE_ENDPOINT") {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
