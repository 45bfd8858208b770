//! NetCanvas CLI - operator tooling for the suggestion pipeline
//!
//! The `ncv` command replays recorded assistant responses against a topology
//! file, checks embedded change proposals, previews device placement and
//! prints the tool catalogue offered to the LLM.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{place, propose, replay, tools};
use config::CliConfig;

/// NetCanvas CLI - AI-assisted network topology changes
#[derive(Parser, Debug)]
#[command(
    name = "ncv",
    author,
    version,
    about = "NetCanvas - reviewable AI suggestions for network topologies"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Pipeline configuration file (overrides the [pipeline] table)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded response through the pipeline
    ///
    /// Feeds the events through the stream demultiplexer, resolves the
    /// completed tool invocations and shows what would be offered for
    /// approval.
    Replay {
        /// Recorded events (JSONL of protocol events, or raw SSE with --sse)
        events: PathBuf,

        /// Topology JSON file
        #[arg(short, long)]
        topology: PathBuf,

        /// Treat the events file as a raw SSE capture
        #[arg(long)]
        sse: bool,

        /// User message that started the turn
        #[arg(long)]
        input: Option<String>,

        /// Approve the surfaced suggestion and commit it
        #[arg(long)]
        approve: bool,

        /// Write the committed topology here
        #[arg(long, requires = "approve")]
        out: Option<PathBuf>,

        /// Seed for placement jitter
        #[arg(long)]
        seed: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract and check a change proposal from assistant text
    Propose {
        /// File containing the assistant message
        message: PathBuf,

        /// Topology JSON file
        #[arg(short, long)]
        topology: PathBuf,

        /// Fail when the proposal is blocked
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview where a new device would be placed
    Place {
        /// Device name
        name: String,

        /// Device type (router, switch, ap, ...)
        #[arg(long = "type")]
        device_type: String,

        /// Topology JSON file
        #[arg(short, long)]
        topology: PathBuf,

        /// Building the device belongs to
        #[arg(long)]
        building: Option<String>,

        /// Name of a device it connects to (repeatable)
        #[arg(long)]
        connect: Vec<String>,

        /// Seed for placement jitter
        #[arg(long)]
        seed: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools offered to the LLM
    Tools {
        /// Only show tools whose name contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cli_config = CliConfig::discover_and_load();

    let log_level = args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("info");
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let pipeline = cli_config.pipeline_config(args.config.as_deref())?;
    let default_json = cli_config.json_output();

    match args.command {
        Command::Replay { events, topology, sse, input, approve, out, seed, json } => {
            let options = replay::ReplayOptions {
                events,
                topology,
                sse,
                input,
                approve,
                out,
                seed,
                json: json || default_json,
            };
            replay::execute(options, pipeline).await
        }
        Command::Propose { message, topology, strict, json } => {
            propose::execute(&message, &topology, &pipeline.proposal, strict, json || default_json)
        }
        Command::Place { name, device_type, topology, building, connect, seed, json } => {
            let options = place::PlaceOptions {
                topology,
                name,
                device_type,
                building,
                connect,
                seed,
                json: json || default_json,
            };
            place::execute(options, pipeline.placement)
        }
        Command::Tools { filter, json } => tools::list(filter.as_deref(), json || default_json),
    }
}
