//! Trading engine orchestrator - entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use helion_bot::{Application, EngineConfig};
use helion_broker::mock::MockBroker;
use helion_core::Price;
use helion_telemetry::{init_logging, LogFormat};
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (also settable via HELION_CONFIG).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the orchestrator and run until interrupted.
    Run,
    /// Load and validate configuration, then exit.
    ValidateConfig,
    /// Print the fully-merged effective configuration as JSON.
    PrintConfig,
}

fn config_path(args: &Args) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| std::env::var("HELION_CONFIG").ok().map(PathBuf::from))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Run => {
            let config = EngineConfig::load(config_path(&args).as_deref())
                .context("loading configuration")?;

            let log_format = match config.telemetry.log_format {
                helion_bot::config::LogFormatSetting::Json => LogFormat::Json,
                helion_bot::config::LogFormatSetting::Text => LogFormat::Text,
            };
            init_logging(log_format)?;
            info!(version = env!("CARGO_PKG_VERSION"), "starting trading engine orchestrator");
            tracing::warn!("no exchange adapter configured, running against MockBroker (paper mode)");

            // A real deployment implements `helion_broker::Broker` against an
            // exchange's wire protocol and substitutes it here; this binary
            // ships only the in-memory paper broker.
            let broker = Arc::new(MockBroker::new(Price::new(dec!(100))));

            let app = Application::new(broker, &config)
                .await
                .context("constructing application")?;
            app.run().await.context("running application")?;
        }
        Command::ValidateConfig => {
            let config = EngineConfig::load(config_path(&args).as_deref())
                .context("loading configuration")?;
            config.validate().context("validating configuration")?;
            println!("configuration is valid");
        }
        Command::PrintConfig => {
            let config = EngineConfig::load(config_path(&args).as_deref())
                .context("loading configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
