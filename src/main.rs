//! # Clutch Bridge
//!
//! Present wireless clutch paddle telemetry to a host as calibrated game
//! controller axes.
//!
//! Receives sensor datagrams over UDP, runs them through the calibration
//! engine and forwards HID reports to the USB gadget over serial.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use clutch_bridge::bridge::Bridge;
use clutch_bridge::config::{Config, LoggingConfig};
use clutch_bridge::control::{self, Command};
use clutch_bridge::link::HostLink;
use clutch_bridge::processor::IngestPipeline;
use clutch_bridge::receiver::{DatagramReceiver, MAX_DATAGRAM_LEN};

/// Configuration file used when `--config` is not given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "clutch-bridge", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the receiver bind address (e.g. 0.0.0.0:4210)
    #[arg(long)]
    bind: Option<String>,
}

/// Main entry point for Clutch Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration and set up logging
///    - Bind the sensor datagram socket
///    - Open the serial link to the HID gadget
///
/// 2. **Main Loop**
///    - Ingest each datagram and forward the HID report
///    - Log status every `status.interval_ms`
///    - Execute operator console commands from stdin
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration is invalid, the socket cannot be
/// bound or no serial device can be opened.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(bind) = cli.bind {
        config.receiver.bind = bind;
        config.validate()?;
    }

    let _log_guard = init_logging(&config.logging);

    info!("Clutch Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let layout = config.hid.layout;
    let pipeline = Arc::new(IngestPipeline::new(layout.output_scale()));
    info!("HID layout: {} (output scale {})", layout, layout.output_scale());

    let receiver = DatagramReceiver::bind(config.bind_addr()?, config.peer_filter()?)
        .await
        .context("failed to bind sensor socket")?;
    if !receiver.peers().is_empty() {
        info!("Accepting datagrams from {} registered peer(s)", receiver.peers().len());
    }

    let link = HostLink::open(&config.link.port, config.link.baud_rate)?;
    info!("HID gadget link opened at: {}", link.device_path());

    let mut bridge = Bridge::new(Arc::clone(&pipeline), layout, link);
    let default_duration = config.default_calibration_duration();

    let mut status_interval = interval(Duration::from_millis(config.status.interval_ms));
    status_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    status_interval.tick().await;

    let mut console = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    let mut buf = [0u8; MAX_DATAGRAM_LEN];

    info!("Waiting for sensor datagrams (type 'help' for console commands)");
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            received = receiver.recv(&mut buf) => {
                match received {
                    Ok((len, sender)) => {
                        bridge.handle_datagram(sender, &buf, len, Instant::now()).await;
                    }
                    Err(e) => warn!("Receive error: {}", e),
                }
            }

            _ = status_interval.tick() => bridge.log_status(),

            line = console.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) => handle_console_line(&line, &pipeline, default_duration),
                    Ok(None) => {
                        debug!("Console input closed");
                        console_open = false;
                    }
                    Err(e) => {
                        warn!("Console read error: {}", e);
                        console_open = false;
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                let (packets, bytes) = pipeline.get_stats();
                info!("Total packets processed: {} ({} bytes)", packets, bytes);
                info!("Total reports sent: {}", bridge.reports_sent());
                pipeline.deinit()?;
                break;
            }
        }
    }

    Ok(())
}

/// Load the configuration file, falling back to defaults when the default
/// path does not exist.
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("failed to load {}", path.display())),
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).with_context(|| format!("failed to load {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

/// Install the console subscriber, plus a daily log file when configured.
///
/// The returned guard must stay alive for buffered file logs to be flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let console = tracing_subscriber::fmt::layer();

    if config.dir.is_empty() {
        tracing_subscriber::registry().with(filter).with(console).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.dir, "clutch-bridge.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);

    tracing_subscriber::registry().with(filter).with(console).with(file).init();
    Some(guard)
}

fn handle_console_line(line: &str, pipeline: &IngestPipeline, default_duration: Duration) {
    let result = Command::parse(line)
        .and_then(|command| command.map(|c| control::execute(c, pipeline, default_duration)).transpose());

    match result {
        Ok(Some(reply)) => println!("{}", reply),
        Ok(None) => {}
        Err(e) => warn!("Console command '{}' failed: {}", line.trim(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from(["clutch-bridge", "--config", "/etc/clutch.toml", "--bind", "127.0.0.1:9000"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/clutch.toml")));
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["clutch-bridge"]);
        assert!(cli.config.is_none());
        assert!(cli.bind.is_none());
    }

    #[test]
    fn test_load_config_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/clutch-bridge.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_console_line_drives_pipeline() {
        let pipeline = IngestPipeline::new(4095);
        handle_console_line("start 500", &pipeline, Duration::from_secs(5));
        assert!(pipeline.is_calibrating());
        handle_console_line("bogus", &pipeline, Duration::from_secs(5));
        handle_console_line("reset", &pipeline, Duration::from_secs(5));
        assert!(!pipeline.is_calibrating());
    }
}
