//! Wiring: knowledge tables, collaborators, client and filter in one place.

use std::sync::Arc;

use tracing::info;

use triage_contracts::{error::TriageResult, history::MedicalHistory};
use triage_core::{
    traits::{LlmClient, Recommender, SymptomExtractor},
    PriorityPolicy, TriageMachine,
};
use triage_knowledge::{KnowledgeBase, BUILTIN_KNOWLEDGE};
use triage_llm::{HttpLlmClient, LlmRecommender, LlmSymptomExtractor};
use triage_safety::SafetyFilter;

use crate::{
    config::AppConfig,
    offline::{CannedRecommender, KeywordExtractor, OfflineClient},
    turn::{run_turn, run_turn_report, TurnReport},
};

/// A ready-to-use triage pipeline. Immutable; share it behind an `Arc`.
pub struct TriageRuntime {
    machine: TriageMachine,
    client: Arc<dyn LlmClient>,
    safety: SafetyFilter,
}

impl TriageRuntime {
    /// Assemble a runtime from explicit parts.
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        extractor: Arc<dyn SymptomExtractor>,
        recommender: Arc<dyn Recommender>,
        client: Arc<dyn LlmClient>,
        policy: PriorityPolicy,
    ) -> Self {
        let machine = TriageMachine::new(extractor, knowledge.clone(), knowledge, recommender)
            .with_policy(policy);

        Self {
            machine,
            client,
            safety: SafetyFilter::new(),
        }
    }

    /// Language-model extractor and recommender over `client`.
    pub fn with_llm(
        knowledge: Arc<KnowledgeBase>,
        client: Arc<dyn LlmClient>,
        policy: PriorityPolicy,
    ) -> Self {
        Self::new(
            knowledge,
            Arc::new(LlmSymptomExtractor::new()),
            Arc::new(LlmRecommender::new()),
            client,
            policy,
        )
    }

    /// Keyword extraction and canned advice; never touches the network.
    pub fn offline(knowledge: Arc<KnowledgeBase>, policy: PriorityPolicy) -> Self {
        let extractor = KeywordExtractor::from_knowledge(&knowledge);
        Self::new(
            knowledge,
            Arc::new(extractor),
            Arc::new(CannedRecommender),
            Arc::new(OfflineClient),
            policy,
        )
    }

    /// Build from configuration.
    ///
    /// # Errors
    ///
    /// `TriageError::Config` if the knowledge file is unreadable or, when not
    /// offline, no API key is configured.
    pub fn from_config(config: &AppConfig, offline: bool) -> TriageResult<Self> {
        let knowledge = Arc::new(load_knowledge(config)?);
        let policy = config.priority_policy();

        let runtime = if offline {
            Self::offline(knowledge, policy)
        } else {
            let client = HttpLlmClient::new(config.llm.clone())?;
            Self::with_llm(knowledge, Arc::new(client), policy)
        };

        info!(offline, policy = ?policy, "triage runtime ready");
        Ok(runtime)
    }

    /// Run one filtered turn.
    pub fn run_turn(&self, user_input: &str, history: &MedicalHistory) -> String {
        run_turn(&self.machine, &self.safety, user_input, history, self.client.as_ref())
    }

    pub fn run_turn_report(&self, user_input: &str, history: &MedicalHistory) -> TurnReport {
        run_turn_report(&self.machine, &self.safety, user_input, history, self.client.as_ref())
    }
}

/// The configured knowledge file, or the compiled-in tables.
pub fn load_knowledge(config: &AppConfig) -> TriageResult<KnowledgeBase> {
    match &config.triage.knowledge {
        Some(path) => KnowledgeBase::from_file(path),
        None => KnowledgeBase::from_toml_str(BUILTIN_KNOWLEDGE),
    }
}

