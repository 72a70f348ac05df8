//! # Arduino Pad Bridge
//!
//! Turn an Arduino serial controller into a virtual gamepad.
//!
//! This application reads 12-field lines from the Arduino, conditions the
//! readings and drives a uinput gamepad that games see as a regular pad.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use arduino_pad_bridge::config::{Config, LoggingConfig};
use arduino_pad_bridge::device::UinputGamepad;
use arduino_pad_bridge::serial::SerialConnector;
use arduino_pad_bridge::session::ControllerSession;

/// Used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// How often connectivity changes are checked for logging
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Main entry point for Arduino Pad Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (`arduino-pad-bridge [config.toml]`)
///    - Set up logging with tracing subscriber
///    - Create the uinput virtual gamepad
///
/// 2. **Main Loop**
///    - Controller session runs on its own task, reconnecting as needed
///    - Connectivity changes are logged
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the session and wait for it to close the port
///    - Virtual gamepad is left in neutral
///
/// # Errors
///
/// Returns error if:
/// - Configuration is invalid
/// - `/dev/uinput` is not accessible
///
/// # Examples
///
/// ```bash
/// ARDUINO_PORT=/dev/ttyUSB0 cargo run --release
/// ```
///
/// Expected output:
/// ```text
/// INFO arduino_pad_bridge: Arduino Pad Bridge v0.1.0 starting...
/// INFO arduino_pad_bridge::device::uinput: Created virtual gamepad 'Arduino Custom Gamepad'
/// INFO arduino_pad_bridge::serial: Opened serial port /dev/ttyUSB0 at 9600 baud
/// INFO arduino_pad_bridge::session: Connected to Arduino on /dev/ttyUSB0
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path))?
    } else {
        Config::from_env()?
    };

    let _log_guard = init_logging(&config.logging)?;

    info!("Arduino Pad Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if !config_found {
        warn!("Configuration file {} not found, using defaults", config_path);
    }

    let gamepad = UinputGamepad::create(&config.session.device_name)
        .context("Do you have /dev/uinput access? Try: sudo modprobe uinput")?;
    let connector = SerialConnector::new(config.serial.settle_delay());

    let mut session = ControllerSession::new(&config, connector, gamepad);
    let handle = session.handle();
    let status = session.status();

    let session_task = tokio::spawn(async move {
        session.run_loop().await;
    });

    info!("Press Ctrl+C to exit");

    let mut status_interval = interval(STATUS_POLL_INTERVAL);
    let mut last_connected = None;

    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                let connected = status.get_connectivity();
                if last_connected != Some(connected) {
                    if connected {
                        info!("Arduino connected on {}", config.serial.port);
                    } else {
                        info!("Waiting for Arduino on {}", config.serial.port);
                    }
                    last_connected = Some(connected);
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    handle.stop();
    session_task.await.context("Controller session task failed")?;

    Ok(())
}

/// Installs the tracing subscriber.
///
/// The returned guard must be held for the life of the process when file
/// logging is enabled, or buffered lines are lost.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let level: tracing::Level = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.level))?;
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "arduino-pad-bridge.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(file_writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let contents = std::fs::read_to_string(path).unwrap();
        let bundled: Config = toml::from_str(&contents).unwrap();
        assert!(bundled.validate().is_ok());
        assert_eq!(bundled, Config::default());
    }
}
