//! # Guardia Console Library
//!
//! Terminal front end for the guard scanner. Drives a
//! [`ScanSessionController`](guardia_nfc::ScanSessionController) over the
//! simulated radio from commands typed on stdin.
//!
//! ## Module Organization
//! ```text
//! guardia_console_lib/
//! ├── lib.rs          ◄─── You are here (startup & command loop)
//! ├── display.rs      ◄─── Frame rendering and the console emitter
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── scanner.rs  ◄─── Controller, radio and scan task
//! │   └── config.rs   ◄─── Configuration snapshot
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command parsing and dispatch
//! │   ├── scan.rs     ◄─── scan / tap / cancel / next / retry
//! │   └── config.rs   ◄─── status / config
//! └── error.rs        ◄─── Error type for commands
//! ```

pub mod commands;
pub mod display;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use guardia_nfc::{ScannerConfig, SimulatedRadio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Command, Reply};
use display::{render_view, ConsoleEmitter};
use error::{AppError, AppResult};
use state::{ConfigState, ScannerState};

/// Runs the console until `quit` or end of input.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                         Console Startup                                 │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: INFO, DEBUG for guardia crates; override with RUST_LOG   │
/// │                                                                         │
/// │  2. Load scanner.toml ────────────────────────────────────────────────► │
/// │     • First argument, else $GUARDIA_CONFIG, else the platform default   │
/// │     • GUARDIA_* environment overrides, then validation                  │
/// │                                                                         │
/// │  3. Build Scanner ────────────────────────────────────────────────────► │
/// │     • SimulatedRadio + ScanSessionController + ConsoleEmitter           │
/// │     • initialize(): probe once, notice printed on failure               │
/// │                                                                         │
/// │  4. Command Loop ─────────────────────────────────────────────────────► │
/// │     • One command per stdin line                                        │
/// │     • quit / EOF: teardown, wait for the scan task                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> AppResult<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Guardia console");

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let scanner_config = ScannerConfig::load(config_path)?;
    let config = ConfigState::from(&scanner_config);
    info!(
        device = %config.device_name,
        primary = %config.primary_tech,
        fallback = ?config.fallback_tech,
        "Scanner config loaded"
    );

    let emitter = Arc::new(ConsoleEmitter::new(
        config.header(),
        config.unknown_tag_label.clone(),
    ));
    let scanner = ScannerState::new(
        Arc::new(SimulatedRadio::default()),
        &scanner_config,
        emitter,
    );

    if let Err(e) = scanner.controller().initialize().await {
        warn!(error = %e, "NFC radio not ready");
    }
    println!(
        "{}",
        render_view(&config.header(), &scanner.view(&config.unknown_tag_label))
    );
    println!("Type 'help' for commands.");

    let result = command_loop(&scanner, &config).await;
    scanner.shutdown().await;
    result
}

async fn command_loop(scanner: &ScannerState, config: &ConfigState) -> AppResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("End of input");
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                return Err(AppError::internal(format!("Failed to read stdin: {}", e)));
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", AppError::from(e));
                continue;
            }
        };

        match commands::execute(scanner, config, command).await {
            Ok(Reply::Quit) => return Ok(()),
            Ok(Reply::Silent) => {}
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(Reply::Json(value)) => println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            ),
            Err(e) => println!("{}", e),
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=guardia=trace` - Show trace for guardia crates only
/// - Default: INFO, DEBUG for guardia crates
///
/// Logs go to stderr so they do not interleave with the screen on stdout.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,guardia=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
