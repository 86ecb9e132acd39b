//! trade_gate - Main Entry Point
//!
//! Reads one JSON decision request from standard input, evaluates it
//! against the loaded predictor artifacts, and writes one JSON decision
//! response to standard output. Malformed input or missing artifacts
//! produce an error response on standard error and a non-zero exit.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use trade_gate::gateway::{DecisionRequest, DecisionResponse, RequestGateway};
use trade_gate::predictor::ArtifactPredictor;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory with model artifacts (overrides the configured one)
    #[arg(long)]
    models_dir: Option<String>,

    /// Emit the detailed recommendation (decision + analysis block)
    #[arg(long)]
    recommend: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to initialize logging");
    }

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("decision failed: {e:#}");
            emit_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = trade_gate::config::load_config(Some(&args.config))?;

    let models_dir = args
        .models_dir
        .clone()
        .unwrap_or(config.model.models_dir.clone());
    let predictor = ArtifactPredictor::load(Path::new(&models_dir))?;
    info!(models_dir = %models_dir, "predictor ready");

    let gateway = RequestGateway::new(config.engine, Box::new(predictor));

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    if input.trim().is_empty() {
        anyhow::bail!("no input data");
    }

    let request: DecisionRequest = serde_json::from_str(&input)
        .map_err(|e| anyhow::anyhow!("invalid JSON request: {e}"))?;

    let output = if args.recommend {
        let recommendation = gateway.recommend(request)?;
        serde_json::to_string(&recommendation)?
    } else {
        let response = gateway.decide(request)?;
        serde_json::to_string(&response)?
    };
    println!("{output}");
    Ok(())
}

/// Error responses go to stderr so stdout stays a clean decision channel
fn emit_error(reason: &str) {
    let response = DecisionResponse::error(reason);
    match serde_json::to_string(&response) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!("{{\"execute\": false, \"reason\": \"{reason}\"}}"),
    }
}
