//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use conclave_application::{
    BlackboardPlanExecutor, ModelRouter, NoRunLogger, NullPerformanceStore, OrchestrateInput,
    Orchestrator, PerformanceStore, PerformanceTracker, PlanExecutor, RunLogger,
};
use conclave_domain::{
    Blackboard, ConfigIssue, HeuristicPlanner, HierarchicalPlanner, Planner, RoleHierarchy,
};
use conclave_infrastructure::{
    ConfigLoader, FileConfig, JsonFilePerformanceStore, JsonlRunLogger, build_clients,
};
use conclave_presentation::{
    AskArgs, Cli, Command, ConsoleFormatter, OutputFormat, PlanArgs, ProgressReporter, RouteArgs,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting conclave");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("{}", e))?
    };

    match &cli.command {
        Command::Ask(args) => ask(&cli, &config, args).await,
        Command::Plan(args) => plan(&cli, &config, args).await,
        Command::Route(args) => route(&cli, &config, args),
        Command::Stats => stats(&cli, &config),
        Command::Roles => roles(&cli),
        Command::Config => show_config(&cli, &config),
    }
}

/// Install the tracing subscriber; the guard must live until exit when
/// logging to a file.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let Some(path) = log_file else {
        builder.with_writer(std::io::stderr).init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("invalid log file path: {}", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));
    builder.with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}

fn ensure_valid(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    report_warnings(&issues);
    let errors: Vec<String> = issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(|issue| format!("  {}", issue.message))
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration:\n{}", errors.join("\n"));
    }
    Ok(())
}

fn report_warnings(issues: &[ConfigIssue]) {
    for issue in issues.iter().filter(|issue| !issue.is_error()) {
        warn!("{}", issue.message);
    }
}

fn tracker(config: &FileConfig) -> Arc<PerformanceTracker> {
    let store: Box<dyn PerformanceStore> = match config.tracker.resolved_store_path() {
        Some(path) => {
            info!("Performance ledger: {}", path.display());
            Box::new(JsonFilePerformanceStore::new(path))
        }
        None => Box::new(NullPerformanceStore),
    };
    Arc::new(PerformanceTracker::new(store))
}

/// Build the shared router from configuration
fn router(config: &FileConfig) -> Result<Arc<ModelRouter>> {
    ensure_valid(config)?;

    let setup = build_clients(config);
    report_warnings(&setup.issues);
    if setup.registry.is_empty() {
        bail!("no routable models: define [providers.<name>] commands for your models (see `conclave config`)");
    }

    let logger: Arc<dyn RunLogger> = match config.logging.run_log.as_ref() {
        Some(path) => match JsonlRunLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoRunLogger),
        },
        None => Arc::new(NoRunLogger),
    };

    let router = ModelRouter::new(
        Arc::new(setup.registry),
        Arc::new(setup.clients),
        tracker(config),
    )
    .with_config(config.router.clone())
    .with_logger(logger);
    Ok(Arc::new(router))
}

async fn ask(cli: &Cli, config: &FileConfig, args: &AskArgs) -> Result<()> {
    let orchestrator = Orchestrator::new(router(config)?, config.orchestration());

    let mut input = OrchestrateInput::new(args.question.clone()).with_mode(args.mode.into());
    if args.diffuse {
        input = input.with_diffusion();
    }
    if args.adaptive {
        input = input.with_adaptive_ensemble();
    }

    let outcome = if cli.quiet || cli.format == OutputFormat::Json {
        orchestrator.execute(input).await?
    } else {
        let progress = ProgressReporter::new();
        orchestrator.execute_with_progress(input, &progress).await?
    };

    match cli.format {
        OutputFormat::Text => println!("{}", ConsoleFormatter::outcome(&outcome)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::json(&outcome)),
    }
    Ok(())
}

async fn plan(cli: &Cli, config: &FileConfig, args: &PlanArgs) -> Result<()> {
    let planner: Box<dyn Planner> = if args.hierarchical {
        Box::new(HierarchicalPlanner::new(RoleHierarchy::standard()))
    } else {
        Box::new(HeuristicPlanner::new())
    };

    let (plan, execution) = if args.execute {
        let router = router(config)?;
        let plan = planner.plan(&args.task, router.registry())?;
        let board = Blackboard::new();
        let execution = BlackboardPlanExecutor::new(Arc::clone(&router))
            .execute(&args.task, &plan, &board)
            .await?;
        (plan, Some(execution))
    } else {
        (planner.plan(&args.task, &config.catalog())?, None)
    };

    match cli.format {
        OutputFormat::Text => println!("{}", ConsoleFormatter::plan(&plan, execution.as_ref())),
        OutputFormat::Json => println!(
            "{}",
            ConsoleFormatter::json(&serde_json::json!({
                "planner": planner.name(),
                "plan": plan,
                "execution": execution,
            }))
        ),
    }
    Ok(())
}

fn route(cli: &Cli, config: &FileConfig, args: &RouteArgs) -> Result<()> {
    let decision = router(config)?.decide(&args.question, args.mode.into())?;
    match cli.format {
        OutputFormat::Text => print!("{}", ConsoleFormatter::decision(&decision)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::json(&decision)),
    }
    Ok(())
}

fn stats(cli: &Cli, config: &FileConfig) -> Result<()> {
    let snapshot = tracker(config).snapshot();
    match cli.format {
        OutputFormat::Text => print!("{}", ConsoleFormatter::stats(&snapshot)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::json(&snapshot)),
    }
    Ok(())
}

fn roles(cli: &Cli) -> Result<()> {
    let hierarchy = RoleHierarchy::standard();
    match cli.format {
        OutputFormat::Text => print!("{}", ConsoleFormatter::roles(&hierarchy)),
        OutputFormat::Json => {
            let roles: Vec<_> = hierarchy.roles().collect();
            println!("{}", ConsoleFormatter::json(&roles));
        }
    }
    Ok(())
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    let sources = ConfigLoader::sources(cli.config.as_ref());
    let setup = build_clients(config);
    let mut issues = config.validate();
    issues.extend(setup.issues);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration sources (in priority order):");
            for source in &sources {
                let mark = if source.found { "FOUND" } else { "     " };
                println!("  [{}] {:<11} {}", mark, source.kind.as_str(), source.location);
            }
            println!();
            println!("Routable models: {}", setup.registry.names().join(", "));
            println!();
            print!("{}", ConsoleFormatter::issues(&issues));
        }
        OutputFormat::Json => {
            let sources: Vec<_> = sources
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "kind": s.kind.as_str(),
                        "location": s.location,
                        "found": s.found,
                    })
                })
                .collect();
            let issues: Vec<_> = issues
                .iter()
                .map(|i| {
                    serde_json::json!({
                        "severity": if i.is_error() { "error" } else { "warning" },
                        "message": i.message,
                    })
                })
                .collect();
            println!(
                "{}",
                ConsoleFormatter::json(&serde_json::json!({
                    "sources": sources,
                    "routable_models": setup.registry.names(),
                    "issues": issues,
                    "config": config,
                }))
            );
        }
    }
    Ok(())
}
