//! Command-line front end: prints dataset info, predictions, insights or a
//! health report as JSON.
//!
//! ```text
//! paddy [--config <file.json>] [--data <dataset>] <command>
//!
//!   info                      Dataset summary
//!   predict <region> <soil>   Held-out predictions and top features
//!   insights <region> <soil>  Yield range, confidence and key factors
//!   health                    Dataset status and cache size
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to change the level.

use std::path::PathBuf;
use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paddy::{SegmentKey, ServiceConfig, YieldService};

const USAGE: &str = "paddy [--config <file.json>] [--data <dataset>] <command>

  info                      Dataset summary
  predict <region> <soil>   Held-out predictions and top features
  insights <region> <soil>  Yield range, confidence and key factors
  health                    Dataset status and cache size";

// =============================================================================
// Arguments
// =============================================================================

enum Command {
    Info,
    Predict(String, String),
    Insights(String, String),
    Health,
}

struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Result<Args, String> {
    let mut config = None;
    let mut data = None;
    let mut positional = Vec::new();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(it.next().ok_or("--config needs a path")?)),
            "--data" => data = Some(PathBuf::from(it.next().ok_or("--data needs a path")?)),
            "--help" | "-h" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown option: {other}")),
            _ => positional.push(arg),
        }
    }

    let segment = |rest: &[String]| match rest {
        [region, soil] => Ok((region.clone(), soil.clone())),
        _ => Err("expected <region> <soil>".to_string()),
    };
    let command = match positional.split_first() {
        Some((cmd, [])) if cmd == "info" => Command::Info,
        Some((cmd, [])) if cmd == "health" => Command::Health,
        Some((cmd, rest)) if cmd == "predict" => {
            let (region, soil) = segment(rest)?;
            Command::Predict(region, soil)
        }
        Some((cmd, rest)) if cmd == "insights" => {
            let (region, soil) = segment(rest)?;
            Command::Insights(region, soil)
        }
        _ => return Err(USAGE.to_string()),
    };

    Ok(Args {
        config,
        data,
        command,
    })
}

// =============================================================================
// Main
// =============================================================================

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn run(args: Args) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => ServiceConfig::default(),
    };
    if let Some(data) = args.data {
        config.dataset_path = Some(data);
    }

    let service = YieldService::from_config(&config, None);
    service.initialize();

    let key = |region: String, soil: String| SegmentKey::new(region, soil).map_err(|e| e.to_string());
    match args.command {
        Command::Info => {
            let summary = service
                .dataset_summary()
                .ok_or_else(|| "dataset not loaded".to_string())?;
            print_json(&summary)
        }
        Command::Predict(region, soil) => {
            let report = service.predict(&key(region, soil)?).map_err(|e| e.to_string())?;
            print_json(&report)
        }
        Command::Insights(region, soil) => {
            let insights = service.insights(&key(region, soil)?).map_err(|e| e.to_string())?;
            print_json(&insights)
        }
        Command::Health => print_json(&service.stats()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paddy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = parse_args().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
