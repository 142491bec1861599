//! Pipewatch Server: recurring pipeline job scheduler
//!
//! Main entry point that loads configuration, wires the search backend and
//! job registry into the scheduler, and runs until a task fails.

use std::convert::Infallible;
use std::error::Error;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use pipewatch_core::config::AppConfig;
use pipewatch_core::traits::search::SearchBackend;
use pipewatch_search::HttpSearchBackend;
use pipewatch_worker::jobs::register_builtin_jobs;
use pipewatch_worker::{JobRegistry, Orchestrator, SchedulerError};

/// Recurring pipeline job scheduler
#[derive(Debug, Parser)]
#[command(name = "pipewatch-server", version)]
struct Cli {
    /// Path to the JSON service configuration
    /// (defaults to $PIPEWATCH_CONFIG, then ./service_config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration, print a summary, and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            std::env::var("PIPEWATCH_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./service_config.json"))
        })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", error_chain(&e));
            std::process::exit(1);
        }
    };

    // --check output goes to stdout on its own, without log lines mixed in
    if cli.check {
        let (summary, ok) = render_summary(&config, &build_registry());
        print!("{}", summary);
        std::process::exit(if ok { 0 } else { 1 });
    }

    init_logging(&config);

    let registry = build_registry();

    let Err(e) = run(config, registry).await;
    tracing::error!("Scheduler stopped: {}", error_chain(&e));
    std::process::exit(1);
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Registry with every built-in job
fn build_registry() -> Arc<JobRegistry> {
    let mut registry = JobRegistry::new();
    register_builtin_jobs(&mut registry);
    Arc::new(registry)
}

/// Start the scheduler; returns only when a task fails
async fn run(config: AppConfig, registry: Arc<JobRegistry>) -> Result<Infallible, SchedulerError> {
    tracing::info!("#### Starting Pipewatch v{} ####", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Pipelines: {:?}", config.pipelines);

    let backend = HttpSearchBackend::new(&config.search).map_err(SchedulerError::Configuration)?;
    match backend.health_check().await {
        Ok(true) => tracing::info!("Search backend at {} is healthy", config.search.url),
        Ok(false) => tracing::warn!("Search backend at {} reports red health", config.search.url),
        Err(e) => tracing::warn!("Search backend at {} is unreachable: {}", config.search.url, e),
    }
    let backend: Arc<dyn SearchBackend> = Arc::new(backend);

    let orchestrator = Orchestrator::from_config(&config, registry, backend)?;
    orchestrator.run().await
}

/// Render the effective schedule. The flag is `false` if any enabled job has no handler.
fn render_summary(config: &AppConfig, registry: &JobRegistry) -> (String, bool) {
    let mut out = String::new();
    let _ = writeln!(out, "consumers: {}", config.num_consumers);
    let _ = writeln!(out, "registered jobs: {}", registry.registered_names().join(", "));

    for (name, pipeline) in &config.pipelines {
        let state = if pipeline.enabled { "enabled" } else { "disabled" };
        let _ = writeln!(out, "pipeline '{}' ({}) every {}s", name, state, pipeline.period);
        for job in &pipeline.jobs {
            let mark = if job.enabled { "+" } else { "-" };
            let _ = writeln!(out, "  {} {}", mark, job.name);
        }
    }

    let missing = registry.missing_jobs(config);
    for (pipeline, job) in &missing {
        let _ = writeln!(out, "error: pipeline '{}' uses unregistered job '{}'", pipeline, job);
    }
    (out, missing.is_empty())
}

/// Render an error and its sources on one line
fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
