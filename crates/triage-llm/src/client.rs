//! Chat-completion clients.
//!
//! `HttpLlmClient` talks to any OpenAI-compatible `/chat/completions`
//! endpoint with a blocking `reqwest` client. Timeouts and bounded retries
//! live here, at the collaborator boundary, so the triage machine itself
//! never waits or retries.
//!
//! `FakeLlmClient` replays scripted replies for tests and offline runs.

use std::{
    sync::Mutex,
    thread,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use triage_contracts::{
    error::{TriageError, TriageResult},
    llm::ChatRequest,
};
use triage_core::traits::LlmClient;

use crate::config::LlmConfig;

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    content: Option<String>,
}

/// Failure of a single HTTP attempt, tagged with whether a retry may help.
struct AttemptError {
    reason: String,
    transient: bool,
}

// ── HTTP client ───────────────────────────────────────────────────────────────

/// Blocking client for an OpenAI-compatible chat-completions API.
///
/// Safe to share across threads; one instance can serve every session.
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// `TriageError::Config` when no API key is configured or the HTTP client
    /// cannot be constructed.
    pub fn new(config: LlmConfig) -> TriageResult<Self> {
        if config.api_key.is_none() {
            return Err(TriageError::config(
                "no API key configured; set GROQ_API_KEY or TRIAGE_API_KEY",
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TriageError::config(format!("failed to create HTTP client: {}", e)))?;

        debug!(endpoint = %config.endpoint, model = %config.model, "LLM client initialized");
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn attempt(&self, request: &ChatRequest) -> Result<String, AttemptError> {
        let body = WireRequest {
            model: &self.config.model,
            messages: [
                WireMessage { role: "system", content: &request.system },
                WireMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(self.config.completions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                AttemptError {
                    reason: format!("request timed out after {} seconds", self.config.timeout_secs),
                    transient: true,
                }
            } else {
                AttemptError {
                    reason: format!("request failed: {}", e),
                    transient: e.is_connect(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError {
                reason: format!("HTTP {} from chat completions endpoint", status),
                transient: status.is_server_error() || status.as_u16() == 429,
            });
        }

        let parsed: WireResponse = response.json().map_err(|e| AttemptError {
            reason: format!("failed to parse completion response: {}", e),
            transient: false,
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AttemptError {
                reason: "provider returned an empty completion".to_string(),
                transient: false,
            })
    }
}

impl LlmClient for HttpLlmClient {
    fn complete(&self, request: &ChatRequest) -> TriageResult<String> {
        let mut attempt = 0;
        loop {
            match self.attempt(request) {
                Ok(text) => return Ok(text),
                Err(err) if err.transient && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        reason = %err.reason,
                        "transient LLM failure, retrying"
                    );
                    thread::sleep(Duration::from_millis(250 * u64::from(attempt)));
                }
                Err(err) => return Err(TriageError::provider(err.reason)),
            }
        }
    }
}

// ── Fake client ───────────────────────────────────────────────────────────────

/// A scripted client for tests and offline runs.
///
/// Replies are consumed in order; the last one repeats once the script is
/// exhausted. Every request is recorded for inspection.
pub struct FakeLlmClient {
    replies: Mutex<Vec<TriageResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeLlmClient {
    pub fn new(replies: Vec<TriageResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client that always answers with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// A client that always fails with a provider error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::new(vec![Err(TriageError::provider(reason))])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LlmClient for FakeLlmClient {
    fn complete(&self, request: &ChatRequest) -> TriageResult<String> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|e| TriageError::provider(format!("fake client lock poisoned: {}", e)))?;

        match replies.len() {
            0 => Err(TriageError::provider("fake client has no scripted reply")),
            1 => replies[0].clone(),
            _ => replies.remove(0),
        }
    }
}
