//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use conclave_domain::RoutingMode;
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Routing preference between latency and answer quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Speed,
    #[default]
    Accuracy,
}

impl From<ModeArg> for RoutingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Speed => RoutingMode::Speed,
            ModeArg::Accuracy => RoutingMode::Accuracy,
        }
    }
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Multi-model orchestration: routing, ensembles and consensus debate")]
#[command(long_about = r#"
Conclave routes each question to the models best suited for it, falls back
when an answer is weak, and lets several models debate until they agree.

Configuration files are loaded from (in priority order):
1. --config <path>                    Explicit config file
2. ./conclave.toml                    Project-level config
3. ~/.config/conclave/config.toml     Global config
4. CONCLAVE_* environment variables   e.g. CONCLAVE_ROUTER__MIN_QUALITY=0.6

Example:
  conclave ask "What is the capital of Australia?"
  conclave ask --mode speed --diffuse "explain lifetimes"
  conclave plan --hierarchical "Research and summarise the history of Rust"
  conclave route "Is this contract clause enforceable?"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a question with routing, fallback and (for hard questions) consensus
    Ask(AskArgs),
    /// Decompose a task into a reasoning plan, optionally executing it
    Plan(PlanArgs),
    /// Show which models a question would be routed to
    Route(RouteArgs),
    /// Show recorded model performance
    Stats,
    /// Show the role hierarchy
    Roles,
    /// Show configuration sources and validation issues
    Config,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    #[arg(short, long, value_enum, default_value = "accuracy")]
    pub mode: ModeArg,

    /// Refine the prompt with several models before answering
    #[arg(long)]
    pub diffuse: bool,

    /// Weight ensemble answers by model history instead of debating
    #[arg(long)]
    pub adaptive: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// The task to plan
    pub task: String,

    /// Use the role hierarchy to plan
    #[arg(long)]
    pub hierarchical: bool,

    /// Run the plan against the configured models
    #[arg(long)]
    pub execute: bool,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    /// The question to route
    pub question: String,

    #[arg(short, long, value_enum, default_value = "accuracy")]
    pub mode: ModeArg,
}
