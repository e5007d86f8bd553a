//! Symptom triage: command-line front-end
//!
//! Usage:
//!   triage chat                         interactive loop
//!   triage ask "I have chest pain"      one turn
//!   triage analyze '["headache"]'       completeness check only
//!
//! Every command accepts `--offline` (no language model), `--config <file>`,
//! `--knowledge <file>` and `--urgency-first`.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use triage_contracts::{
    error::{TriageError, TriageResult},
    history::MedicalHistory,
};
use triage_session::{load_knowledge, AppConfig, PrioritySetting, TriageRuntime, TriageSession};

const SEPARATOR_WIDTH: usize = 50;
const GOODBYE: &str = "Goodbye! Remember to consult a real doctor for medical concerns.";

// ── CLI definition ────────────────────────────────────────────────────────────

/// Symptom triage assistant.
///
/// Routes a description of symptoms to an emergency alert, a request for
/// missing details, or general recommendations. Not medical advice.
#[derive(Parser)]
#[command(name = "triage", version, about = "Symptom triage assistant (not medical advice)")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalOpts {
    /// Configuration file with [llm] and [triage] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Knowledge tables to use instead of the configured or built-in ones.
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Use keyword extraction and canned advice; no network calls.
    #[arg(long, global = true)]
    offline: bool,

    /// Let emergencies preempt clarification requests.
    #[arg(long, global = true)]
    urgency_first: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session; type `exit` or `quit` to leave.
    Chat(HistoryArgs),
    /// Triage a single description and print the response.
    Ask {
        /// The symptom description.
        text: String,
        #[command(flatten)]
        history: HistoryArgs,
        /// Print the full turn report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the details missing from a JSON array of symptom tokens.
    Analyze {
        /// e.g. '["chest_pain", "fever"]'
        symptoms: String,
    },
}

#[derive(Args, Default)]
struct HistoryArgs {
    /// Comma-separated allergies.
    #[arg(long)]
    allergies: Option<String>,
    /// Comma-separated existing conditions.
    #[arg(long)]
    conditions: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat(history) => run_chat(&cli.opts, history),
        Command::Ask { text, history, json } => run_ask(&cli.opts, &text, history, json),
        Command::Analyze { symptoms } => run_analyze(&cli.opts, &symptoms),
    };

    if let Err(e) = result {
        eprintln!("triage: {}", e);
        if matches!(e, TriageError::Config { .. }) && !cli.opts.offline {
            eprintln!("hint: pass --offline to run without a language model");
        }
        std::process::exit(1);
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config(opts: &GlobalOpts) -> TriageResult<AppConfig> {
    let mut config = AppConfig::load(opts.config.as_deref())?;
    if let Some(path) = &opts.knowledge {
        config.triage.knowledge = Some(path.clone());
    }
    if opts.urgency_first {
        config.triage.priority = PrioritySetting::UrgencyFirst;
    }
    debug!(config = ?config, "configuration loaded");
    Ok(config)
}

fn build_runtime(opts: &GlobalOpts) -> TriageResult<TriageRuntime> {
    TriageRuntime::from_config(&load_config(opts)?, opts.offline)
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_ask(opts: &GlobalOpts, text: &str, history: HistoryArgs, json: bool) -> TriageResult<()> {
    let runtime = build_runtime(opts)?;
    let history = MedicalHistory::from_comma_separated(
        history.allergies.as_deref().unwrap_or_default(),
        history.conditions.as_deref().unwrap_or_default(),
    );

    let report = runtime.run_turn_report(text, &history);
    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| TriageError::io(format!("failed to serialize turn report: {}", e)))?;
        println!("{}", rendered);
    } else {
        println!("{}", report.response);
    }
    Ok(())
}

fn run_analyze(opts: &GlobalOpts, symptoms: &str) -> TriageResult<()> {
    let knowledge = load_knowledge(&load_config(opts)?)?;
    let value: serde_json::Value =
        serde_json::from_str(symptoms).map_err(|e| TriageError::Analysis {
            reason: format!("symptoms are not valid JSON: {}", e),
        })?;

    match knowledge.analyze_value(&value)? {
        Some(missing) => {
            println!("Missing details:");
            for tag in missing {
                println!("  - {}", tag);
            }
        }
        None => println!("No missing details."),
    }
    Ok(())
}

fn run_chat(opts: &GlobalOpts, history: HistoryArgs) -> TriageResult<()> {
    let runtime = Arc::new(build_runtime(opts)?);
    let mut session = TriageSession::new(runtime);

    println!("🏥 Symptom Triage Assistant");
    println!("Describe your symptoms, or type 'exit' to quit.");
    println!("This is not medical advice.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let allergies = match history.allergies {
        Some(a) => a,
        None => prompt(&mut lines, "Any allergies? (comma-separated, Enter for none): ")?
            .unwrap_or_default(),
    };
    let conditions = match history.conditions {
        Some(c) => c,
        None => prompt(&mut lines, "Any existing conditions? (comma-separated, Enter for none): ")?
            .unwrap_or_default(),
    };
    session.update_history(&allergies, &conditions);

    loop {
        let Some(line) = prompt(&mut lines, "\nYou: ")? else {
            println!("\n{}", GOODBYE);
            return Ok(());
        };
        let input = line.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", GOODBYE);
            return Ok(());
        }
        if input.is_empty() {
            println!("Please describe your symptoms");
            continue;
        }

        let report = session.submit(input);
        println!("\nAssistant: {}", report.response);
        println!("{}", "-".repeat(SEPARATOR_WIDTH));
    }
}

/// Print `label` and read one line. `None` at end of input.
fn prompt<B: BufRead>(lines: &mut io::Lines<B>, label: &str) -> TriageResult<Option<String>> {
    print!("{}", label);
    io::stdout().flush().map_err(io_error)?;
    lines.next().transpose().map_err(io_error)
}

fn io_error(e: io::Error) -> TriageError {
    TriageError::io(format!("terminal I/O failed: {}", e))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
