//! ChainTrigger CLI — build manager requests and replay recorded node
//! responses without touching the network.
//!
//! # Commands
//! ```text
//! chaintrigger chains
//! chaintrigger trigger --config <sub.json>
//! chaintrigger health  --config <sub.json>
//! chaintrigger parse   --config <sub.json> --response <reply.json> [--head <head.json>]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use chaintrigger_core::{init_tracing, ChainManager, LogConfig, SubscriptionConfig};
use chaintrigger_evm::{create_manager, Chain};

#[derive(Parser)]
#[command(
    name = "chaintrigger",
    about = "Inspect ChainTrigger chain managers offline",
    version
)]
struct Cli {
    /// Log level: trace | debug | info | warn | error
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported chains and their RPC dialects
    Chains,

    /// Print the trigger request for a subscription
    Trigger {
        /// Subscription config (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// Print the health check request for a subscription
    Health {
        #[arg(long)]
        config: PathBuf,
    },

    /// Replay a recorded node response and print the job-run requests
    Parse {
        #[arg(long)]
        config: PathBuf,
        /// Recorded event response (raw JSON-RPC envelope)
        #[arg(long)]
        response: PathBuf,
        /// Recorded head-block response, applied first
        #[arg(long)]
        head: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        ..LogConfig::default()
    });

    match cli.command {
        Commands::Chains => cmd_chains(),
        Commands::Trigger { config } => cmd_trigger(&config),
        Commands::Health { config } => cmd_health(&config),
        Commands::Parse { config, response, head } => {
            cmd_parse(&config, &response, head.as_deref())
        }
    }
}

fn cmd_chains() -> Result<()> {
    let chains: Vec<Value> = Chain::ALL
        .iter()
        .map(|chain| {
            let p = chain.profile();
            json!({
                "name": p.name,
                "push": p.subscribe_method.is_some(),
                "subscribe": p.subscribe_method,
                "getLogs": p.get_logs_method,
                "head": p.head_method,
                "fromField": p.from_field,
            })
        })
        .collect();
    print_json(&Value::Array(chains))
}

fn cmd_trigger(config: &Path) -> Result<()> {
    let mut manager = load_manager(config)?;
    let request = manager
        .build_trigger_request()
        .context("manager produced no trigger request")?;
    print_json(&parse_bytes(&request)?)
}

fn cmd_health(config: &Path) -> Result<()> {
    let manager = load_manager(config)?;
    match manager.build_health_check_request() {
        Some(request) => print_json(&parse_bytes(&request)?),
        None => {
            println!("no health check in {} mode", manager.state().mode());
            Ok(())
        }
    }
}

fn cmd_parse(config: &Path, response: &Path, head: Option<&Path>) -> Result<()> {
    let mut manager = load_manager(config)?;

    if let Some(head) = head {
        let bytes = read(head)?;
        manager
            .parse_health_check_response(&bytes)
            .context("head response rejected")?;
    }

    let bytes = read(response)?;
    let requests = manager
        .parse_event_response(&bytes)
        .context("event response rejected")?;

    print_json(&json!({
        "requests": requests,
        "cursor": manager.state().cursor().to_string(),
    }))
}

fn load_manager(path: &Path) -> Result<Box<dyn ChainManager>> {
    let config = SubscriptionConfig::from_file(path)
        .with_context(|| format!("loading {}", path.display()))?;
    tracing::debug!(job_id = %config.job_id, chain = %config.chain, "config loaded");
    Ok(create_manager(&config, None)?)
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn parse_bytes(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).context("request is not valid JSON")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
