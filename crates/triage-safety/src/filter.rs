//! Keyword-scanning safety filter.
//!
//! `SafetyFilter` appends a disclaimer block to every outbound response.
//! Filtering runs in two phases:
//!
//! 1. **Scan**: the response is searched case-insensitively for emergency
//!    keywords. Short acronyms (`ER`) must appear as whole words so ordinary
//!    words such as "fever" or "water" do not match.
//! 2. **Append**: a warning banner when any keyword matched, otherwise the
//!    standard disclaimer, then the consult-provider footer in both cases.
//!
//! The filter must run exactly once per outbound message. The triage terminal
//! nodes do not call it; the session boundary does.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Appended when an emergency keyword is present.
pub const WARNING_BANNER: &str =
    "\n\n🚨 SAFETY WARNING: This is not medical advice. Seek immediate professional care!";

/// Appended when no emergency keyword is present.
pub const STANDARD_DISCLAIMER: &str =
    "\n\n🔒 Medical Disclaimer: This is not a substitute for professional medical diagnosis or treatment.";

/// Appended after the banner or disclaimer in every case.
pub const CONSULT_FOOTER: &str = "\n⚕️ Always consult a qualified healthcare provider.";

/// A single emergency keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyKeyword {
    pub text: String,
    /// When true the keyword must be delimited by non-alphanumeric characters.
    pub whole_word: bool,
}

impl SafetyKeyword {
    pub fn substring(text: impl Into<String>) -> Self {
        Self { text: text.into(), whole_word: false }
    }

    pub fn word(text: impl Into<String>) -> Self {
        Self { text: text.into(), whole_word: true }
    }

    /// Case-insensitive match against an already lowercased haystack.
    fn matches(&self, lowered: &str) -> bool {
        let needle = self.text.to_lowercase();
        if !self.whole_word {
            return lowered.contains(&needle);
        }
        lowered.match_indices(&needle).any(|(start, _)| {
            let before = lowered[..start].chars().next_back();
            let after = lowered[start + needle.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    }
}

/// The result of scanning one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyScan {
    /// Keywords found, in keyword-list order.
    pub matched: Vec<String>,
}

impl SafetyScan {
    pub fn is_emergency(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// The outbound-response post-processor.
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    keywords: Vec<SafetyKeyword>,
}

impl SafetyFilter {
    /// The standard keyword set.
    pub fn new() -> Self {
        Self {
            keywords: vec![
                SafetyKeyword::substring("emergency"),
                SafetyKeyword::substring("urgent"),
                SafetyKeyword::substring("911"),
                SafetyKeyword::word("ER"),
                SafetyKeyword::substring("hospital"),
                SafetyKeyword::substring("ambulance"),
                SafetyKeyword::substring("severe"),
                SafetyKeyword::substring("dangerous"),
                SafetyKeyword::substring("life-threatening"),
            ],
        }
    }

    /// Use a custom keyword list instead of the standard set.
    pub fn with_keywords(keywords: Vec<SafetyKeyword>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &[SafetyKeyword] {
        &self.keywords
    }

    /// Report which emergency keywords `response` contains.
    pub fn scan(&self, response: &str) -> SafetyScan {
        let lowered = response.to_lowercase();
        SafetyScan {
            matched: self
                .keywords
                .iter()
                .filter(|k| k.matches(&lowered))
                .map(|k| k.text.clone())
                .collect(),
        }
    }

    /// Append the banner or disclaimer, then the footer.
    pub fn filter(&self, response: &str) -> String {
        let scan = self.scan(response);

        let block = if scan.is_emergency() {
            warn!(keywords = ?scan.matched, "emergency keywords detected in response");
            WARNING_BANNER
        } else {
            debug!(response_len = response.len(), "no emergency keywords; standard disclaimer");
            STANDARD_DISCLAIMER
        };

        let mut out = String::with_capacity(response.len() + block.len() + CONSULT_FOOTER.len());
        out.push_str(response);
        out.push_str(block);
        out.push_str(CONSULT_FOOTER);
        out
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}
