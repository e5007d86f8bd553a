//! # triage-safety
//!
//! The mandatory disclaimer layer for outbound triage responses.
//!
//! ```rust,ignore
//! use triage_safety::SafetyFilter;
//!
//! let shown = SafetyFilter::new().filter("Rest and drink fluids.");
//! ```

pub mod filter;

pub use filter::{
    SafetyFilter, SafetyKeyword, SafetyScan, CONSULT_FOOTER, STANDARD_DISCLAIMER, WARNING_BANNER,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
