//! # triage-session
//!
//! The orchestration layer shared by the CLI and the TUI.
//!
//! - [`run_turn`]: one complaint in, one filtered response out, never fails
//! - [`TriageRuntime`]: machine, client, tables and filter wired together
//! - [`TriageSession`]: in-memory history and transcript for one user
//! - [`AppConfig`]: the `[llm]` / `[triage]` configuration file
//! - [`offline`]: collaborators for runs without a language model

pub mod config;
pub mod offline;
pub mod runtime;
pub mod session;
pub mod turn;

pub use config::{AppConfig, PrioritySetting, TriageSettings};
pub use runtime::{load_knowledge, TriageRuntime};
pub use session::{Role, TranscriptEntry, TriageSession};
pub use turn::{run_turn, run_turn_report, TurnReport, NO_RESPONSE_FALLBACK};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, sync::Arc};

    use triage_contracts::{
        error::{TriageError, TriageResult},
        history::MedicalHistory,
        outcome::TriageOutcome,
    };
    use triage_core::{
        machine::EMERGENCY_MESSAGE,
        traits::{LlmClient, Recommender},
        PriorityPolicy,
    };
    use triage_knowledge::KnowledgeBase;
    use triage_llm::{FakeLlmClient, RECOMMENDATION_REMINDER};
    use triage_safety::{CONSULT_FOOTER, STANDARD_DISCLAIMER, WARNING_BANNER};

    use super::*;
    use crate::offline::KeywordExtractor;

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::builtin())
    }

    fn llm_runtime(
        fake: FakeLlmClient,
        policy: PriorityPolicy,
    ) -> (TriageRuntime, Arc<FakeLlmClient>) {
        let fake = Arc::new(fake);
        let client: Arc<dyn LlmClient> = fake.clone();
        (TriageRuntime::with_llm(knowledge(), client, policy), fake)
    }

    fn scripted(replies: &[&str]) -> FakeLlmClient {
        FakeLlmClient::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn assert_single_footer(response: &str) {
        assert!(response.ends_with(CONSULT_FOOTER), "missing footer: {}", response);
        assert_eq!(response.matches(CONSULT_FOOTER).count(), 1);
    }

    struct BlankRecommender;

    impl Recommender for BlankRecommender {
        fn recommend(
            &self,
            _symptoms: &[String],
            _history: &MedicalHistory,
            _client: &dyn LlmClient,
        ) -> TriageResult<String> {
            Ok(String::new())
        }
    }

    // ── Turns through the language-model collaborators ──────────────────────

    #[test]
    fn test_incomplete_chest_pain_asks_for_details() {
        let (runtime, fake) = llm_runtime(scripted(&["chest pain"]), PriorityPolicy::default());
        let report = runtime.run_turn_report("I have chest pain", &MedicalHistory::default());

        assert!(report.response.starts_with(
            "Please clarify: chest_pain_duration, chest_pain_radiation, chest_pain_intensity?"
        ));
        assert!(report.response.contains(STANDARD_DISCLAIMER));
        assert_single_footer(&report.response);
        assert!(matches!(report.outcome, Some(TriageOutcome::NeedsClarification { .. })));
        assert_eq!(fake.call_count(), 1, "recommender must not be called");
    }

    #[test]
    fn test_urgency_first_preempts_clarification() {
        let (runtime, fake) = llm_runtime(scripted(&["chest pain"]), PriorityPolicy::UrgencyFirst);
        let response = runtime.run_turn("I have chest pain", &MedicalHistory::default());

        assert!(response.starts_with(EMERGENCY_MESSAGE));
        assert_single_footer(&response);
        assert_eq!(fake.call_count(), 1);
    }

    #[test]
    fn test_high_urgency_without_requirements_is_emergency() {
        let (runtime, _fake) =
            llm_runtime(scripted(&["shortness of breath"]), PriorityPolicy::default());
        let report = runtime.run_turn_report("I can't breathe", &MedicalHistory::default());

        match report.outcome {
            Some(TriageOutcome::Emergency { message }) => assert_eq!(message, EMERGENCY_MESSAGE),
            other => panic!("expected Emergency, got {:?}", other),
        }
        assert_eq!(report.symptoms, vec!["shortness_of_breath"]);
    }

    #[test]
    fn test_unknown_symptom_is_recommended() {
        let (runtime, fake) =
            llm_runtime(scripted(&["runny nose", "- 🍵 Warm fluids"]), PriorityPolicy::default());
        let report = runtime.run_turn_report("my nose keeps running", &MedicalHistory::default());

        match &report.outcome {
            Some(TriageOutcome::Recommended { provider_failed, .. }) => assert!(!provider_failed),
            other => panic!("expected Recommended, got {:?}", other),
        }
        assert!(report.response.starts_with("- 🍵 Warm fluids"));
        assert!(report.response.contains(RECOMMENDATION_REMINDER));
        assert_single_footer(&report.response);
        assert_eq!(fake.call_count(), 2);
    }

    #[test]
    fn test_provider_outage_still_answers() {
        let (runtime, fake) =
            llm_runtime(FakeLlmClient::unavailable("HTTP 503"), PriorityPolicy::default());
        let report = runtime.run_turn_report("I feel dizzy", &MedicalHistory::default());

        assert!(report
            .response
            .starts_with("Recommendation error: provider request failed: HTTP 503"));
        match &report.outcome {
            Some(TriageOutcome::Recommended { provider_failed, .. }) => assert!(provider_failed),
            other => panic!("expected Recommended, got {:?}", other),
        }
        assert_single_footer(&report.response);
        assert_eq!(fake.call_count(), 2);
    }

    #[test]
    fn test_empty_input_is_reported_and_filtered() {
        let (runtime, fake) = llm_runtime(scripted(&["unused"]), PriorityPolicy::default());
        let report = runtime.run_turn_report("   ", &MedicalHistory::default());

        assert!(report.response.starts_with("An error occurred: invalid input:"));
        assert!(report.response.contains(STANDARD_DISCLAIMER));
        assert_single_footer(&report.response);
        assert!(report.outcome.is_none());
        assert_eq!(fake.call_count(), 0);
    }

    #[test]
    fn test_blank_response_uses_fallback() {
        let kb = knowledge();
        let runtime = TriageRuntime::new(
            kb.clone(),
            Arc::new(KeywordExtractor::from_knowledge(&kb)),
            Arc::new(BlankRecommender),
            Arc::new(offline::OfflineClient),
            PriorityPolicy::default(),
        );
        let response = runtime.run_turn("hello there", &MedicalHistory::default());

        assert!(response.starts_with(NO_RESPONSE_FALLBACK));
        assert_single_footer(&response);
    }

    // ── Offline collaborators ───────────────────────────────────────────────

    #[test]
    fn test_offline_headache_clarification() {
        let runtime = TriageRuntime::offline(knowledge(), PriorityPolicy::default());
        let response = runtime.run_turn("I have a bad Headache.", &MedicalHistory::default());
        assert!(response.starts_with(
            "Please clarify: headache_onset, headache_frequency, headache_associated_nausea?"
        ));
    }

    #[test]
    fn test_offline_complete_chest_pain_is_emergency() {
        let runtime = TriageRuntime::offline(knowledge(), PriorityPolicy::default());
        let report = runtime.run_turn_report(
            "chest pain, duration 2 hours, radiation to the arm, intensity 8",
            &MedicalHistory::default(),
        );
        assert!(matches!(report.outcome, Some(TriageOutcome::Emergency { .. })));
    }

    #[test]
    fn test_offline_canned_advice_mentions_allergies() {
        let runtime = TriageRuntime::offline(knowledge(), PriorityPolicy::default());
        let history = MedicalHistory::from_comma_separated("penicillin", "");
        let report = runtime.run_turn_report("I feel tired", &history);

        assert!(report.response.contains("Consult a healthcare professional"));
        assert!(report.response.contains("(penicillin)"));
        assert!(report.response.contains(STANDARD_DISCLAIMER));
        assert!(!report.response.contains(WARNING_BANNER));
        assert!(report.safety_keywords.is_empty(), "got {:?}", report.safety_keywords);
    }

    #[test]
    fn test_offline_client_is_unavailable() {
        let request = triage_contracts::llm::ChatRequest::new("s", "u");
        assert!(matches!(
            offline::OfflineClient.complete(&request),
            Err(TriageError::Provider { .. })
        ));
    }

    // ── Session ─────────────────────────────────────────────────────────────

    #[test]
    fn test_session_records_transcript_and_history() {
        let (runtime, fake) =
            llm_runtime(scripted(&["nausea", "- Sip water"]), PriorityPolicy::default());
        let mut session = TriageSession::new(Arc::new(runtime));
        session.update_history("penicillin, ", " asthma");

        session.submit("I feel sick");

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "I feel sick");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert!(transcript[1].at >= transcript[0].at);

        let prompt = &fake.requests()[1].user;
        assert!(prompt.contains("allergies: penicillin; conditions: asthma"));

        session.clear();
        assert!(session.transcript().is_empty());
        assert!(session.history().allergies.contains("penicillin"));
    }

    // ── Config ──────────────────────────────────────────────────────────────

    #[test]
    fn test_config_parses_both_tables() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [llm]
            model = "llama-3.1-8b-instant"
            timeout_secs = 10

            [triage]
            priority = "urgency_first"
            knowledge = "tables.toml"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.llm.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.llm.timeout_secs, 10);
        assert_eq!(cfg.llm.max_retries, 2);
        assert_eq!(cfg.priority_policy(), PriorityPolicy::UrgencyFirst);
        assert_eq!(cfg.triage.knowledge, Some(PathBuf::from("tables.toml")));
    }

    #[test]
    fn test_config_empty_is_default() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.priority_policy(), PriorityPolicy::ClarificationFirst);
    }

    #[test]
    fn test_config_rejects_unknown_priority() {
        match AppConfig::from_toml_str("[triage]\npriority = \"whatever\"") {
            Err(TriageError::Config { reason }) => {
                assert!(reason.starts_with("failed to parse configuration TOML"))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_missing_file() {
        match AppConfig::from_file(std::path::Path::new("/nonexistent/triage.toml")) {
            Err(TriageError::Config { reason }) => {
                assert!(reason.contains("failed to read config file"))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_runtime_requires_api_key_when_online() {
        let result = TriageRuntime::from_config(&AppConfig::default(), false);
        assert!(matches!(result, Err(TriageError::Config { .. })));

        let offline = TriageRuntime::from_config(&AppConfig::default(), true);
        assert!(offline.is_ok());
    }

    #[test]
    fn test_runtime_reports_bad_knowledge_path() {
        let mut cfg = AppConfig::default();
        cfg.triage.knowledge = Some(PathBuf::from("/nonexistent/knowledge.toml"));
        assert!(matches!(
            TriageRuntime::from_config(&cfg, true),
            Err(TriageError::Config { .. })
        ));
    }
}
