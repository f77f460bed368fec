//! Maintenance Mode - gated HTTP server and status toggle

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use config::{ConfigLoader, ConfigValidator, LoggingConfig};
use std::{env, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;

use app::Application;

#[derive(Debug, Parser)]
#[command(name = "maintenance-mode", version, about = "Maintenance mode gate for HTTP services")]
struct Cli {
    /// Configuration file, falls back to $CONFIG_PATH then config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the application behind the maintenance gate
    Serve,
    /// Turn maintenance mode on or off
    Toggle {
        #[arg(long, action = ArgAction::Set)]
        active: bool,
    },
    /// Write an example configuration file
    InitConfig {
        #[arg(default_value = "config.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();

    if let Some(Command::InitConfig { ref path }) = cli.command {
        init_logging(&LoggingConfig::default())?;
        ConfigLoader::create_example(path).context("Failed to write example configuration")?;
        info!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let config_path = cli
        .config
        .clone()
        .or_else(|| env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let config = ConfigLoader::load(&config_path).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    match dotenv_result {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(e) if !e.not_found() => warn!("Could not load .env file: {}", e),
        Err(_) => {}
    }

    info!("Configuration loaded from: {}", config_path.display());
    info!("Provider: {}", config.gate.provider);

    let report = ConfigValidator::report(&config);
    if report.has_warnings() {
        warn!("Configuration warnings: {}", report.summary());
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Toggle { active } => {
            flag_store::set_status(active, &config.toggle_options())
                .await
                .context("Failed to update maintenance status")?;
            info!(active = active, "Maintenance mode updated");
            Ok(())
        }
        Command::Serve | Command::InitConfig { .. } => serve(config).await,
    }
}

async fn serve(config: config::Config) -> Result<()> {
    info!("Starting Maintenance Mode v{}", env!("CARGO_PKG_VERSION"));

    let mut app = Application::new(config)
        .await
        .context("Failed to create application")?;

    info!("Application starting...");
    app.run(shutdown_signal()).await?;

    info!("Maintenance Mode shutdown complete");
    Ok(())
}

/// Resolves on CTRL+C, or never if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining in-flight requests");
}

/// Level and format to log with; `RUST_LOG` and `LOG_FORMAT` win over the file
fn resolve_logging(
    env_level: Option<String>,
    env_format: Option<String>,
    configured: &LoggingConfig,
) -> (String, String) {
    (
        env_level.unwrap_or_else(|| configured.level.clone()),
        env_format.unwrap_or_else(|| configured.format.clone()),
    )
}

/// Initialize logging from the configuration and environment overrides
fn init_logging(configured: &LoggingConfig) -> Result<()> {
    let (log_level, log_format) = resolve_logging(
        env::var("RUST_LOG").ok(),
        env::var("LOG_FORMAT").ok(),
        configured,
    );

    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_level)
        .context("Invalid log filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!(level = %log_level, format = %log_format, "Logging initialized");

    Ok(())
}
