//! # Colmi Ring
//!
//! Stream heart rate, SpO2 and raw accelerometer data from a Colmi smart ring.
//!
//! This application connects to a ring by its configured address, runs one
//! measurement session and prints every reading as it arrives.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use colmi_ring::config::{Config, OutputFormat};
use colmi_ring::report::Reporter;
use colmi_ring::session::{MeasurementKind, MeasurementSession, SessionSettings, StreamExit};
use colmi_ring::transport::ble::BleRing;

/// Log file name prefix when file logging is enabled
const LOG_FILE_PREFIX: &str = "colmi-ring.log";

#[derive(Parser, Debug)]
#[command(name = "colmi-ring")]
#[command(about = "Stream measurements from a Colmi smart ring", version)]
struct Cli {
    /// What to measure
    #[arg(value_enum)]
    measurement: MeasurementKind,

    /// Path to the configuration file
    #[arg(short, long, default_value = "colmi-ring.toml")]
    config: PathBuf,

    /// Ring address, overrides `device.address`
    #[arg(short, long)]
    address: Option<String>,

    /// Output format, overrides `logging.format`
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

/// Main entry point for Colmi Ring
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (defaults when the file is missing)
///    - Set up logging with tracing subscriber (stderr, optional daily file)
///    - Install the Ctrl+C handler that cancels the session
///
/// 2. **Measurement**
///    - Connect to the ring
///    - Run the session, printing readings to stdout as they arrive
///
/// 3. **Shutdown**
///    - Print the summary
///    - Disconnect from the ring
///
/// # Errors
///
/// Returns error if:
/// - Configuration is invalid or no ring address is configured
/// - The ring cannot be reached
/// - A command frame could not be sent
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(address) = cli.address {
        config.device.address = address;
    }
    let format = cli.format.unwrap_or(config.logging.format);

    let _log_guard = init_logging(&config);

    info!("Colmi Ring v{} starting...", env!("CARGO_PKG_VERSION"));
    if !cli.config.exists() {
        info!("No configuration file at {}, using defaults", cli.config.display());
    }

    if config.device.address.trim().is_empty() {
        bail!("No ring address configured (set device.address or pass --address)");
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping measurement...");
            signal_cancel.cancel();
        }
    });

    let mut ring = BleRing::connect(&config.device).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut reporter = Reporter::new(format, std::io::stdout());
        while let Some(event) = events_rx.recv().await {
            if let Err(e) = reporter.event(&event) {
                warn!("Failed to print event: {}", e);
            }
        }
        reporter
    });

    let settings = SessionSettings::from(&config.session);
    let session = MeasurementSession::new(cli.measurement, settings, cancel, events_tx);
    let summary = session.run(&mut ring).await;

    let mut reporter = printer.await?;
    reporter.summary(&summary)?;

    if let Err(e) = ring.disconnect().await {
        warn!("Failed to disconnect: {}", e);
    }

    if let StreamExit::TransportFailed(reason) = summary.exit {
        bail!("Measurement failed: {}", reason);
    }

    Ok(())
}

/// Initialize tracing: stderr always, plus a daily rolling file if configured
///
/// The returned guard flushes the file writer on drop.
fn init_logging(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_measurements() {
        let cli = Cli::try_parse_from(["colmi-ring", "spo2"]).unwrap();
        assert_eq!(cli.measurement, MeasurementKind::Spo2);
        assert_eq!(cli.config, PathBuf::from("colmi-ring.toml"));
        assert!(cli.address.is_none());

        let cli = Cli::try_parse_from(["colmi-ring", "heart-rate", "-a", "AA:BB:CC:DD:EE:FF", "-f", "json"])
            .unwrap();
        assert_eq!(cli.measurement, MeasurementKind::HeartRate);
        assert_eq!(cli.address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(cli.format, Some(OutputFormat::Json));

        let cli = Cli::try_parse_from(["colmi-ring", "raw-motion"]).unwrap();
        assert_eq!(cli.measurement, MeasurementKind::RawMotion);
    }

    #[test]
    fn test_cli_rejects_unknown_measurement() {
        assert!(Cli::try_parse_from(["colmi-ring", "steps"]).is_err());
    }
}
