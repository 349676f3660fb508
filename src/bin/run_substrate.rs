// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vsm_substrate::core::config::{self, SubstrateConfig};
use vsm_substrate::Substrate;

/// Which `ProcessorConfig` lane `--concurrency`/`--batch-size`/
/// `--batch-timeout-ms` apply to.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LaneName {
    HighPriority,
    NormalPriority,
    Analytics,
    PatternMatching,
}

#[derive(Parser)]
#[command(name = "run_substrate", about = "Runs the viable-system event-processing substrate")]
struct Cli {
    /// Path to a YAML configuration file. Flags below override values it sets.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Identifier this node publishes under (broker causality, logging).
    #[arg(long, global = true, default_value = "node-1")]
    node_id: String,

    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long)]
    buffer_capacity: Option<usize>,
    #[arg(long)]
    base_rate_per_sec: Option<f64>,
    #[arg(long)]
    low_attention_threshold: Option<f64>,
    #[arg(long)]
    max_restarts: Option<u32>,

    /// Which lane `--concurrency`/`--batch-size`/`--batch-timeout-ms` apply to.
    #[arg(long)]
    lane: Option<LaneName>,
    #[arg(long)]
    concurrency: Option<usize>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    batch_timeout_ms: Option<u64>,

    #[arg(long)]
    pattern_window_ms: Option<u64>,

    #[arg(long)]
    attention_weight_novelty: Option<f64>,
    #[arg(long)]
    attention_weight_urgency: Option<f64>,
    #[arg(long)]
    attention_weight_relevance: Option<f64>,
    #[arg(long)]
    attention_weight_intensity: Option<f64>,
    #[arg(long)]
    attention_weight_coherence: Option<f64>,

    #[arg(long)]
    fatigue_decay: Option<f64>,
    #[arg(long)]
    oscillation_threshold: Option<f64>,

    #[arg(long)]
    broker_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Loads and validates configuration without starting the substrate.
    Validate,
}

fn apply_overrides(mut config: SubstrateConfig, cli: &Cli) -> SubstrateConfig {
    if let Some(v) = cli.buffer_capacity {
        config.producer.buffer_capacity = v;
    }
    if let Some(v) = cli.base_rate_per_sec {
        config.coordinator.base_rate_per_sec = v;
    }
    if let Some(v) = cli.low_attention_threshold {
        config.coordinator.low_attention_threshold = v;
    }
    if let Some(v) = cli.max_restarts {
        config.supervisor.max_restarts = v;
    }

    if let Some(lane) = cli.lane {
        let lane_config = match lane {
            LaneName::HighPriority => &mut config.processor.high_priority,
            LaneName::NormalPriority => &mut config.processor.normal_priority,
            LaneName::Analytics => &mut config.processor.analytics,
            LaneName::PatternMatching => &mut config.processor.pattern_matching,
        };
        if let Some(v) = cli.concurrency {
            lane_config.concurrency = v;
        }
        if let Some(v) = cli.batch_size {
            lane_config.batch_size = v;
        }
        if let Some(v) = cli.batch_timeout_ms {
            lane_config.batch_timeout_ms = v;
        }
    }

    if let Some(v) = cli.pattern_window_ms {
        config.pattern.window_ms = v;
    }

    if let Some(v) = cli.attention_weight_novelty {
        config.attention.weights.novelty = v;
    }
    if let Some(v) = cli.attention_weight_urgency {
        config.attention.weights.urgency = v;
    }
    if let Some(v) = cli.attention_weight_relevance {
        config.attention.weights.relevance = v;
    }
    if let Some(v) = cli.attention_weight_intensity {
        config.attention.weights.intensity = v;
    }
    if let Some(v) = cli.attention_weight_coherence {
        config.attention.weights.coherence = v;
    }

    if let Some(v) = cli.fatigue_decay {
        config.attention.fatigue_decay_per_tick = v;
    }
    if let Some(v) = cli.oscillation_threshold {
        config.coordinator.oscillation_threshold = v;
    }

    if let Some(v) = cli.broker_endpoint.clone() {
        config.broker.connection_uri = v;
    }

    config
}

fn load_config(cli: &Cli) -> Result<SubstrateConfig, String> {
    let base = match &cli.config {
        Some(path) => config::load_from_file(path).map_err(|e| e.to_string())?,
        None => SubstrateConfig::default(),
    };
    let config = apply_overrides(base, cli);
    config::validate(&config).map_err(|e| e.to_string())?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if matches!(cli.command, Some(Command::Validate)) {
        println!("configuration is valid");
        return ExitCode::SUCCESS;
    }

    let substrate = Arc::new(Substrate::build(&config, cli.node_id.clone()));
    tracing::info!(node_id = %cli.node_id, "starting substrate");

    match substrate.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "substrate terminated");
            ExitCode::FAILURE
        }
    }
}
