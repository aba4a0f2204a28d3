/// Version injected at compile time via TFHARVEST_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TFHARVEST_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tfharvest::config::Config;
use tfharvest::hooks::{default_hooks, run_hooks};
use tfharvest::seed::load_seeds;
use tfharvest::{refresh_all, Resource, ResourceFilter, SnapshotRefresher};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Normalize cloud-resource state for config emission
#[derive(Parser, Debug)]
#[command(name = "tfharvest", version = VERSION, about, long_about = None)]
struct Args {
    /// Seed file (JSON or YAML) listing discovered resources
    #[arg(short, long)]
    seeds: PathBuf,

    /// Snapshot of refreshed states (JSON or YAML)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Filter expression, e.g. "Type=monitor;Name=tags;Value=team:infra" or "dashboard=id1:id2"
    #[arg(short, long)]
    filter: Vec<String>,

    /// Maximum refreshes in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Remember snapshot and concurrency for later runs
    #[arg(long)]
    save: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tfharvest started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tfharvest").join("tfharvest.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tfharvest").join("tfharvest.log");
    }
    PathBuf::from("tfharvest.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    let filters = parse_filters(&config.effective_filters(&args.filter))?;
    let (initial, state_filters): (Vec<_>, Vec<_>) =
        filters.into_iter().partition(ResourceFilter::is_initial);

    let snapshot = config
        .effective_snapshot(args.snapshot.as_deref())
        .context("No snapshot configured. Pass --snapshot or set snapshot_path in the config")?;
    let concurrency = config.effective_concurrency(args.concurrency);

    if args.save {
        config.snapshot_path = Some(snapshot.clone());
        config.concurrency = Some(concurrency);
        config.save().context("Failed to save configuration")?;
    }

    let mut resources = load_seeds(&args.seeds)?;

    // id filters need no state, so skip refreshing what they drop
    resources.retain(|resource| retained(&initial, resource));

    let refresher = SnapshotRefresher::from_path(&snapshot)?;
    let summary = refresh_all(&mut resources, &refresher, concurrency).await;
    tracing::info!(
        "Refreshed {} resources, {} failed",
        summary.refreshed,
        summary.failed
    );
    if summary.failed > 0 {
        eprintln!("Warning: {} resources could not be refreshed", summary.failed);
    }

    resources.retain(|resource| resource.instance_state.is_some());
    run_hooks(&default_hooks(), &mut resources);
    resources.retain(|resource| retained(&state_filters, resource));

    tracing::info!("Emitting {} resources", resources.len());
    println!("{}", serde_json::to_string_pretty(&resources)?);

    Ok(())
}

fn parse_filters(expressions: &[String]) -> Result<Vec<ResourceFilter>> {
    expressions
        .iter()
        .map(|expr| {
            expr.parse::<ResourceFilter>()
                .with_context(|| format!("Invalid filter {:?}", expr))
        })
        .collect()
}

fn retained(filters: &[ResourceFilter], resource: &Resource) -> bool {
    filters.iter().all(|filter| filter.filter(resource))
}
