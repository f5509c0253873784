//! TableWatch - upstream readiness poller
//!
//! CLI entry point; exits non-zero when the watch fails or runs out of retries.

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use tablewatch::cli::Cli;
use tablewatch::{Config, ConsoleReporter, SnowSql, Watcher};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let level = match cli_log_level.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(&cli.config_file, cli.mode(), &cli.variables)
        .context(format!("Failed to load configuration from {}", cli.config_file.display()))?;

    info!(
        tables = config.tables.len(),
        tasks = config.tasks.len(),
        dry_run = cli.dry_run,
        "tablewatch starting"
    );

    let client = SnowSql::new(config.warehouse.clone());
    let result = Watcher::new(config, client)
        .with_reporter(ConsoleReporter::stdout())
        .dry_run(cli.dry_run)
        .run();

    if let Err(e) = result {
        let label = if e.is_exhausted() {
            "Upstream tables/tasks not ready in time"
        } else {
            "Watch failed"
        };
        return Err(e).context(label);
    }

    Ok(())
}
