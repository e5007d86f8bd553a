//! Provider-neutral chat completion request.

use serde::{Deserialize, Serialize};

/// Sampling temperature used for both extraction and recommendation.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Completion length cap used for both extraction and recommendation.
pub const DEFAULT_MAX_TOKENS: u32 = 400;

/// One system + user exchange sent to a language-model client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Create a request with the default temperature and token cap.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}
