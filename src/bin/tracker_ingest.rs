//! CLI tool to run a single ingestion batch.
//!
//! Usage:
//!   cargo run --bin tracker-ingest
//!   cargo run --bin tracker-ingest -- --limit 5
//!   cargo run --bin tracker-ingest -- --limit 5 --matrix 3

use std::env;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ci_test_tracker::config::Config;
use ci_test_tracker::services::{Aggregator, IngestSettings, Ingestor, TravisClient};
use ci_test_tracker::store;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error initializing logging: {}", e);
    }

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "help" || a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let limit = parse_usize_arg(&args, "--limit", "-l").unwrap_or(config.tracker.ingest_limit);
    let matrix_window = parse_usize_arg(&args, "--matrix", "-m");

    let tracker_store = match store::open(config.database.as_ref()).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            std::process::exit(1);
        }
    };

    let provider = match TravisClient::new(&config.ci) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error creating CI client: {}", e);
            std::process::exit(1);
        }
    };

    let ingestor = Ingestor::new(
        Arc::new(provider),
        tracker_store.clone(),
        IngestSettings::from_config(&config),
    );

    let summary = match ingestor.ingest(limit).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Ingestion failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("Ingestion complete:");
    println!("  Builds:             {}", summary.builds);
    println!("  Jobs:               {}", summary.jobs);
    println!("  Jobs with outcomes: {}", summary.jobs_with_outcomes);
    println!("  Failed fetches:     {}", summary.failed_fetches);
    println!("  Outcomes:           {}", summary.outcomes);

    if let Some(window) = matrix_window {
        let matrix = match Aggregator::new(tracker_store).aggregate(window).await {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Aggregation failed: {}", e);
                std::process::exit(1);
            }
        };
        match serde_json::to_string_pretty(&matrix) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error encoding matrix: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Value of `--long <n>` / `-s <n>`; exits on a malformed number.
fn parse_usize_arg(args: &[String], long: &str, short: &str) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        if (args[i] == long || args[i] == short) && i + 1 < args.len() {
            return match args[i + 1].parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    eprintln!("Error: {} must be a positive integer", long);
                    std::process::exit(1);
                }
            };
        }
        i += 1;
    }
    None
}

fn print_usage() {
    eprintln!("Usage: tracker-ingest [OPTIONS]");
    eprintln!();
    eprintln!("Runs one ingestion batch against the configured CI provider and store.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -l, --limit <n>    Builds to ingest (default: TRACKER_INGEST_LIMIT)");
    eprintln!("  -m, --matrix <n>   Print the result matrix for the <n> newest builds");
    eprintln!("  -h, --help         Show this help");
}
