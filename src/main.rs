use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pipedream_provider::api::client::PipedreamClient;
use pipedream_provider::api::http::format_api_error;
use pipedream_provider::config::{Config, DEFAULT_CONFIG_FILE};
use pipedream_provider::host::{Action, DesiredConfig, PlannedChange, Reconciler};
use pipedream_provider::resource::{get_all_resource_keys, get_resource};
use pipedream_provider::ProviderError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Reconcile Pipedream workflows against a declarative configuration
#[derive(Parser, Debug)]
#[command(name = "pipedream-provider", version, about, long_about = None)]
struct Args {
    /// Pipedream API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Desired-state configuration file (YAML)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// State file tracking remote identifiers
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh state and show the actions apply would take
    Plan,
    /// Refresh state and execute the plan
    Apply,
    /// Read back every resource in the state file
    Refresh,
    /// Delete every resource in the state file
    Destroy,
    /// Print the resource schemas as JSON
    Schema,
    /// Remember an API base URL in the user configuration
    UseApi {
        /// API base URL, e.g. https://api.pipedream.com/v1
        url: String,
    },
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
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

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

    tracing::info!("pipedream-provider started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("pipedream-provider").join("pipedream-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".pipedream-provider").join("pipedream-provider.log");
    }
    PathBuf::from("pipedream-provider.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Warning: {err:#}");
            None
        }
    };

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        match err.downcast_ref::<ProviderError>() {
            Some(provider_err) => eprintln!("Error: {err:#}\n  {}", format_api_error(provider_err)),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    match args.command {
        Command::Schema => return print_schema(),
        Command::UseApi { ref url } => {
            config.set_api_url(url)?;
            println!("API URL set to {}", url);
            return Ok(());
        }
        _ => {}
    }

    let api_url = config.effective_api_url(args.api_url.as_deref())?;
    let state_path = config.effective_state_file(args.state.as_deref());
    let client = PipedreamClient::new(&api_url).context("Failed to create API client")?;
    tracing::info!("Using API: {}, state: {:?}", client.base_url(), state_path);
    let mut reconciler = Reconciler::open(&client, &state_path)?;

    match args.command {
        Command::Refresh => {
            reconciler.refresh().await?;
            println!(
                "Refreshed {} resource(s)",
                reconciler.state().resources.len()
            );
        }
        Command::Plan => {
            let desired = DesiredConfig::load(&args.config)?;
            reconciler.refresh().await?;
            let changes = reconciler.plan(&desired)?;
            print_plan(&changes);
        }
        Command::Apply => {
            let desired = DesiredConfig::load(&args.config)?;
            reconciler.refresh().await?;
            let changes = reconciler.plan(&desired)?;
            print_plan(&changes);
            let summary = reconciler.apply(&desired, &changes).await?;
            println!("Apply complete: {}", summary);
        }
        Command::Destroy => {
            reconciler.refresh().await?;
            let changes = reconciler.plan_destroy()?;
            print_plan(&changes);
            let summary = reconciler.apply(&DesiredConfig::default(), &changes).await?;
            println!("Destroy complete: {}", summary);
        }
        Command::Schema | Command::UseApi { .. } => {}
    }

    Ok(())
}

fn print_plan(changes: &[PlannedChange]) {
    let pending: Vec<&PlannedChange> = changes
        .iter()
        .filter(|c| c.action != Action::NoOp)
        .collect();

    if pending.is_empty() {
        println!("No changes. Remote workflows match the configuration.");
        return;
    }

    for change in pending {
        println!("{}", change);
    }
}

fn print_schema() -> Result<()> {
    let schemas: BTreeMap<&str, _> = get_all_resource_keys()
        .into_iter()
        .filter_map(|key| get_resource(key).map(|def| (key, def)))
        .collect();

    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
