use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use rr_core::api::feedback_response::{FeedbackResponse, WeightHistoryResponse};
use rr_core::api::rank_request::RankRequest;
use rr_core::api::rank_response::RankResponse;
use rr_core::feedback::FeedbackStats;
use rr_core::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use rr_core::store::StoreSnapshot;
use rr_core::{EngineConfig, MemoryStore, RankingEngine, RankingStore};
use serde::de::DeserializeOwned;
use tracing::info;

mod error;

use error::CliError;

const APP_NAME: &str = "rr";

#[derive(Debug, Parser)]
#[command(name = "rr", about = "Rank candidates, replay recruiter feedback, and audit rankings for bias")]
struct Cli {
    /// Store state file; loaded when present and rewritten after each command
    #[arg(long, env = "RR_STATE_FILE", global = true)]
    state: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    /// Override RR_FEEDBACK_THRESHOLD
    #[arg(long, global = true)]
    feedback_threshold: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank a scenario file and replay any feedback it carries
    Rank {
        /// Scenario JSON: {"job": {...}, "candidates": [...], "feedback": [...]}
        #[arg(long, short)]
        input: PathBuf,
    },
    /// Print current weights, weight history, and feedback stats for a job
    History {
        #[arg(long)]
        job: String,
    },
    /// Print the latest bias report for a job
    Bias {
        #[arg(long)]
        job: String,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_store(state: Option<&Path>) -> Result<MemoryStore, CliError> {
    match state {
        Some(path) if path.exists() => {
            let snapshot: StoreSnapshot = read_json(path)?;
            Ok(MemoryStore::from_snapshot(snapshot)?)
        }
        _ => Ok(MemoryStore::new()),
    }
}

fn save_store(store: &MemoryStore, path: &Path) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(&store.snapshot())?;
    fs::write(path, encoded).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{encoded}");
    Ok(())
}

fn rank_scenario(engine: &RankingEngine, request: RankRequest) -> Result<RankResponse, CliError> {
    let job_id = request.job.id.clone();
    engine.register_job(request.job)?;

    let run = engine.rank(&job_id, &request.candidates)?;
    let bias_report = engine.get_bias_report(&job_id)?;

    let mut feedback = Vec::with_capacity(request.feedback.len());
    for item in request.feedback {
        let outcome =
            engine.submit_feedback(&job_id, &item.candidate_id, item.decision, item.notes)?;
        feedback.push(FeedbackResponse {
            job_id: job_id.clone(),
            candidate_id: item.candidate_id,
            outcome,
            current_weights: engine.current_weights(&job_id)?,
        });
    }

    let weights = if feedback.is_empty() {
        None
    } else {
        Some(WeightHistoryResponse {
            job_id: job_id.clone(),
            current_weights: engine.current_weights(&job_id)?,
            history: engine.get_weight_history(&job_id)?,
            stats: engine.feedback_stats(&job_id)?,
        })
    };

    info!(
        job_id = %job_id,
        ranked = run.ranked.len(),
        skipped = run.skipped.len(),
        feedback = feedback.len(),
        "scenario processed"
    );

    Ok(RankResponse {
        run,
        bias_report,
        feedback,
        weights,
    })
}

fn job_history(store: &MemoryStore, job_id: &str) -> Result<WeightHistoryResponse, CliError> {
    let current_weights = store
        .load_weight_vector(job_id)?
        .ok_or_else(|| CliError::JobNotInState(job_id.to_string()))?;
    let history = store.load_weight_history(job_id)?;
    let records = store.load_feedback(job_id)?;
    let pending = store.load_feedback_since_last_adaptation(job_id)?.len();

    Ok(WeightHistoryResponse {
        job_id: job_id.to_string(),
        current_weights,
        stats: FeedbackStats::from_records(&records, history.len(), pending),
        history,
    })
}

fn run() -> Result<(), CliError> {
    dotenv().ok();
    install_tracing_panic_hook(APP_NAME);
    init_tracing_subscriber(APP_NAME);

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env();
    if let Some(threshold) = cli.feedback_threshold {
        config.feedback_threshold = threshold;
    }

    let store = Arc::new(load_store(cli.state.as_deref())?);

    match cli.command {
        Command::Rank { input } => {
            let request: RankRequest = read_json(&input)?;
            let engine = RankingEngine::new(config, store.clone())?;
            let response = rank_scenario(&engine, request)?;
            print_json(&response, cli.pretty)?;
        }
        Command::History { job } => {
            print_json(&job_history(&store, &job)?, cli.pretty)?;
        }
        Command::Bias { job } => {
            let report = store
                .load_bias_report(&job)?
                .ok_or_else(|| CliError::JobNotInState(job.clone()))?;
            print_json(&report, cli.pretty)?;
        }
    }

    if let Some(path) = cli.state.as_deref() {
        save_store(&store, path)?;
        info!(path = %path.display(), "state saved");
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        tracing::error!(error = %err, "rr failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
