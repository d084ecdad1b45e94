//! Attrition Explorer - HR attrition driver analysis dashboard
//!
//! Loads an employee CSV once, then either serves an interactive
//! dashboard (Driver Explorer, Heatmap Lab, Executive Summary) or
//! prints the executive summary.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments or configuration, or the dataset failed to load

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod render;
mod report;
mod server;
mod session;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use dataset::{DatasetCache, DatasetSchema};
use report::ExecutiveSummary;
use server::AppState;
use session::SessionContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config decides the log level, so it is read before logging starts.
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config)?;

    info!("Attrition Explorer v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, config).await {
        error!("{:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .attrition.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the dataset, bands, server and summary.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Load configuration from an explicit path, the default location, or defaults.
///
/// Also returns the file the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        None => Ok((Config::default(), None)),
    }
}

/// Load the dataset, build the summary, then print it or serve the dashboard.
async fn run(args: &Args, config: Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let data_path = config.data.path.clone();
    let context = SessionContext::new(
        Arc::new(DatasetCache::new()),
        data_path.clone(),
        DatasetSchema::from(&config.data),
        config.explorer.clone(),
    );

    // Fail before binding the port if the data is unusable.
    let dataset = context
        .dataset()
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    let summary = ExecutiveSummary::generate(
        &dataset,
        dataset.feature_columns(),
        dataset.outcome_column(),
        &config.summary,
    )
    .context("Failed to build executive summary")?;

    if args.summary {
        return emit_summary(&summary, args.format, args.output.as_deref());
    }

    let addr = config.server.socket_addr();

    if !args.quiet {
        println!(
            "📊 Loaded {} employees with {} features from {}",
            dataset.len(),
            dataset.feature_columns().len(),
            data_path.display()
        );
        println!("🌐 Dashboard: http://{}", addr);
    }

    let state = AppState::new(context, summary)?;
    server::run(state, addr).await
}

/// Print the summary, or write it to `output`.
fn emit_summary(summary: &ExecutiveSummary, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let content = match format {
        OutputFormat::Json => report::generate_json_summary(summary)?,
        OutputFormat::Markdown => report::generate_markdown_summary(summary),
    };

    match output {
        Some(path) => {
            report::write_summary(&content, path)?;
            eprintln!("✅ Summary saved to: {}", path.display());
        }
        None => print!("{}", content),
    }

    Ok(())
}
