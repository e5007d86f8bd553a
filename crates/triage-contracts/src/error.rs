//! Error types for the triage pipeline.
//!
//! All fallible operations in the pipeline return `TriageResult<T>`.
//! Extraction degradation is deliberately absent: an unavailable extractor is
//! a normal `Extraction` outcome, not an error.

use thiserror::Error;

/// The unified error type for the triage crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// The complaint text was empty or otherwise unusable. Raised before extraction.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The Completeness Analyzer received a value of the wrong shape.
    ///
    /// This is a programmer error and aborts the turn.
    #[error("symptom analysis failed: {reason}")]
    Analysis { reason: String },

    /// A call to the language-model provider failed.
    #[error("provider request failed: {reason}")]
    Provider { reason: String },

    /// The pipeline attempted an illegal step transition or finished without a response.
    #[error("state machine error: {reason}")]
    StateMachine { reason: String },

    /// A configuration or knowledge file is missing, unreadable, or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Reading from or writing to the front-end's terminal failed.
    #[error("I/O error: {reason}")]
    Io { reason: String },
}

impl TriageError {
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider { reason: reason.into() }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config { reason: reason.into() }
    }

    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io { reason: reason.into() }
    }
}

/// Convenience alias used throughout the triage crates.
pub type TriageResult<T> = Result<T, TriageError>;
