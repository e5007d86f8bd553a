//! Language-model collaborators for the triage pipeline.
//!
//! - [`HttpLlmClient`]: blocking client for OpenAI-compatible chat completions
//! - [`FakeLlmClient`]: scripted client for tests and demos
//! - [`LlmSymptomExtractor`] / [`LlmRecommender`]: prompt wrappers that
//!   implement the core collaborator traits

pub mod client;
pub mod config;
pub mod extractor;
pub mod recommender;

pub use client::{FakeLlmClient, HttpLlmClient};
pub use config::LlmConfig;
pub use extractor::LlmSymptomExtractor;
pub use recommender::{LlmRecommender, RECOMMENDATION_REMINDER};

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        io::{Read, Write},
        net::{TcpListener, TcpStream},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        thread,
    };

    use super::*;
    use crate::extractor::{normalize_token, parse_symptom_list, EXTRACT_SYSTEM_PROMPT};
    use triage_contracts::{
        error::TriageError,
        history::MedicalHistory,
        llm::ChatRequest,
        state::Extraction,
    };
    use triage_core::traits::{LlmClient, Recommender, SymptomExtractor};

    // ── Config ────────────────────────────────────────────────────────────────

    #[test]
    fn test_config_defaults() {
        let cfg = LlmConfig::default();
        assert_eq!(cfg.endpoint, "https://api.groq.com/openai/v1");
        assert_eq!(cfg.model, "gemma2-9b-it");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_retries, 2);
        assert!(cfg.api_key.is_none());
        assert_eq!(
            cfg.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_config_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GROQ_API_KEY", "groq-key"),
            ("TRIAGE_API_KEY", "triage-key"),
            ("TRIAGE_MODEL", "llama-3.1-8b-instant"),
            ("TRIAGE_ENDPOINT", "  "),
        ]
        .into_iter()
        .collect();

        let cfg = LlmConfig::default()
            .with_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.api_key.as_deref(), Some("triage-key"));
        assert_eq!(cfg.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.endpoint, "https://api.groq.com/openai/v1", "blank value ignored");
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let cfg = LlmConfig {
            api_key: Some("sk-secret".to_string()),
            ..LlmConfig::default()
        };
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_http_client_requires_api_key() {
        match HttpLlmClient::new(LlmConfig::default()) {
            Err(TriageError::Config { reason }) => assert!(reason.contains("GROQ_API_KEY")),
            Err(other) => panic!("expected Config error, got {:?}", other),
            Ok(_) => panic!("expected Config error, got a client"),
        }
    }

    #[test]
    fn test_completions_url_trims_trailing_slash() {
        let cfg = LlmConfig {
            endpoint: "http://localhost:11434/v1/".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(cfg.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    // ── HTTP client ───────────────────────────────────────────────────────────

    const HEADACHE_COMPLETION: &str =
        r#"{"choices":[{"message":{"role":"assistant","content":"headache"}}]}"#;

    /// A loopback server answering successive connections from a script.
    struct StubServer {
        endpoint: String,
        hits: Arc<AtomicUsize>,
        heads: Arc<Mutex<Vec<String>>>,
    }

    impl StubServer {
        fn start(script: Vec<(&'static str, &'static str)>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let endpoint = format!("http://{}/v1", listener.local_addr().unwrap());
            let hits = Arc::new(AtomicUsize::new(0));
            let heads = Arc::new(Mutex::new(Vec::new()));

            let (hit_counter, seen_heads) = (hits.clone(), heads.clone());
            thread::spawn(move || {
                for (status, body) in script {
                    let Ok((mut stream, _)) = listener.accept() else {
                        return;
                    };
                    let head = read_request(&mut stream);
                    seen_heads.lock().unwrap().push(head);
                    hit_counter.fetch_add(1, Ordering::SeqCst);

                    let reply = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(reply.as_bytes());
                }
            });

            Self { endpoint, hits, heads }
        }

        fn client(&self, max_retries: u32) -> HttpLlmClient {
            HttpLlmClient::new(LlmConfig {
                endpoint: self.endpoint.clone(),
                api_key: Some("test-key".to_string()),
                timeout_secs: 5,
                max_retries,
                ..LlmConfig::default()
            })
            .unwrap()
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    /// Read one request (head and body) and return the lowercased head.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let mut expected: Option<usize> = None;
        loop {
            if let Some(total) = expected {
                if buf.len() >= total {
                    break;
                }
            }
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if expected.is_none() {
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    expected = Some(end + 4 + body_len);
                }
            }
        }
        let end = buf.windows(4).position(|w| w == b"\r\n\r\n").unwrap_or(buf.len());
        String::from_utf8_lossy(&buf[..end]).to_lowercase()
    }

    #[test]
    fn test_http_client_retries_server_error_then_succeeds() {
        let server = StubServer::start(vec![
            ("503 Service Unavailable", "{}"),
            ("200 OK", HEADACHE_COMPLETION),
        ]);
        let client = server.client(2);

        let reply = client.complete(&ChatRequest::new("sys", "user")).unwrap();

        assert_eq!(reply, "headache");
        assert_eq!(server.hits(), 2);

        let heads = server.heads.lock().unwrap();
        assert!(heads[0].starts_with("post /v1/chat/completions "));
        assert!(heads[0].contains("authorization: bearer test-key"));
    }

    #[test]
    fn test_http_client_does_not_retry_client_error() {
        let server = StubServer::start(vec![
            ("400 Bad Request", r#"{"error":"bad model"}"#),
            ("200 OK", HEADACHE_COMPLETION),
        ]);
        let client = server.client(2);

        match client.complete(&ChatRequest::new("sys", "user")) {
            Err(TriageError::Provider { reason }) => assert!(reason.contains("HTTP 400")),
            other => panic!("expected Provider error, got {:?}", other),
        }
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn test_http_client_retries_are_bounded() {
        let server = StubServer::start(vec![
            ("429 Too Many Requests", "{}"),
            ("502 Bad Gateway", "{}"),
            ("503 Service Unavailable", "{}"),
            ("200 OK", HEADACHE_COMPLETION),
        ]);
        let client = server.client(2);

        match client.complete(&ChatRequest::new("sys", "user")) {
            Err(TriageError::Provider { reason }) => assert!(reason.contains("HTTP 503")),
            other => panic!("expected Provider error, got {:?}", other),
        }
        assert_eq!(server.hits(), 3, "one attempt plus two retries");
    }

    #[test]
    fn test_http_client_null_content_is_empty_completion() {
        let server = StubServer::start(vec![(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )]);

        match server.client(2).complete(&ChatRequest::new("sys", "user")) {
            Err(TriageError::Provider { reason }) => {
                assert_eq!(reason, "provider returned an empty completion")
            }
            other => panic!("expected Provider error, got {:?}", other),
        }
        assert_eq!(server.hits(), 1, "an empty completion is not retried");
    }

    #[test]
    fn test_http_client_empty_choices_is_empty_completion() {
        let server = StubServer::start(vec![("200 OK", r#"{"choices":[]}"#)]);

        let result = server.client(0).complete(&ChatRequest::new("sys", "user"));
        assert_eq!(
            result,
            Err(TriageError::provider("provider returned an empty completion"))
        );
    }

    // ── Fake client ───────────────────────────────────────────────────────────

    #[test]
    fn test_fake_client_replays_then_repeats_last() {
        let client = FakeLlmClient::new(vec![Ok("first".into()), Ok("second".into())]);
        let req = ChatRequest::new("s", "u");
        assert_eq!(client.complete(&req).unwrap(), "first");
        assert_eq!(client.complete(&req).unwrap(), "second");
        assert_eq!(client.complete(&req).unwrap(), "second");
        assert_eq!(client.call_count(), 3);
    }

    // ── Extractor ─────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token(" Chest Pain. ").as_deref(), Some("chest_pain"));
        assert_eq!(normalize_token("- short-of-breath").as_deref(), Some("short_of_breath"));
        assert_eq!(normalize_token("  ").as_deref(), None);
        assert_eq!(normalize_token("\"Fever\"").as_deref(), Some("fever"));
    }

    #[test]
    fn test_parse_symptom_list_drops_empties_and_duplicates() {
        let parsed = parse_symptom_list("Headache, , fever,headache, Nausea");
        assert_eq!(parsed, vec!["headache", "fever", "nausea"]);
        assert!(parse_symptom_list("None").is_empty());
    }

    #[test]
    fn test_extractor_sends_extraction_prompt() {
        let client = FakeLlmClient::always("chest pain");
        let extraction = LlmSymptomExtractor::new().extract("I have chest pain", &client);

        assert_eq!(
            extraction,
            Extraction::Detected {
                symptoms: vec!["chest_pain".to_string()]
            }
        );
        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].system, EXTRACT_SYSTEM_PROMPT);
        assert_eq!(sent[0].user, "Extract medical symptoms from: I have chest pain");
        assert_eq!(sent[0].max_tokens, 400);
    }

    #[test]
    fn test_extractor_none_detected() {
        let client = FakeLlmClient::always(" , ");
        let extraction = LlmSymptomExtractor::new().extract("hello", &client);
        assert_eq!(extraction, Extraction::NoneDetected);
    }

    #[test]
    fn test_extractor_degrades_on_provider_error() {
        let client = FakeLlmClient::unavailable("connection refused");
        match LlmSymptomExtractor::new().extract("I feel dizzy", &client) {
            Extraction::ProviderUnavailable { reason } => {
                assert!(reason.contains("connection refused"))
            }
            other => panic!("expected ProviderUnavailable, got {:?}", other),
        }
    }

    // ── Recommender ───────────────────────────────────────────────────────────

    #[test]
    fn test_recommender_appends_reminder() {
        let client = FakeLlmClient::always("- 💧 Stay hydrated\n");
        let history = MedicalHistory::from_comma_separated("penicillin", "asthma");
        let text = LlmRecommender::new()
            .recommend(&["fever".to_string()], &history, &client)
            .unwrap();

        assert!(text.starts_with("- 💧 Stay hydrated"));
        assert!(text.ends_with(RECOMMENDATION_REMINDER));

        let sent = &client.requests()[0];
        assert!(sent.user.starts_with("Given these symptoms: fever and medical history:"));
        assert!(sent.user.contains("allergies: penicillin; conditions: asthma"));
        assert!(sent.user.contains("1. Never diagnose conditions"));
        assert!(sent.system.starts_with("You are a cautious medical assistant."));
    }

    #[test]
    fn test_recommender_empty_history_and_symptoms() {
        let client = FakeLlmClient::always("- Rest");
        LlmRecommender::new()
            .recommend(&[], &MedicalHistory::default(), &client)
            .unwrap();
        let sent = &client.requests()[0];
        assert!(sent.user.starts_with("Given these symptoms:  and medical history: none reported"));
    }

    #[test]
    fn test_recommender_propagates_provider_error() {
        let client = FakeLlmClient::unavailable("HTTP 503");
        match LlmRecommender::new().recommend(&[], &MedicalHistory::default(), &client) {
            Err(TriageError::Provider { reason }) => assert!(reason.contains("503")),
            other => panic!("expected Provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_recommender_rejects_blank_completion() {
        let client = FakeLlmClient::always("   ");
        let result = LlmRecommender::new().recommend(&[], &MedicalHistory::default(), &client);
        assert!(matches!(result, Err(TriageError::Provider { .. })));
    }
}
