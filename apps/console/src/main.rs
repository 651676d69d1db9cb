//! # Guardia Console Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        guardia-console                                  │
//! │                                                                         │
//! │  stdin ──► commands/ ──► ScannerState ──► ScanSessionController        │
//! │                                                │                        │
//! │  stdout ◄── ConsoleEmitter ◄── state changes ◄─┘                        │
//! │  stderr ◄── tracing                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `guardia-console [path/to/scanner.toml]`

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = guardia_console_lib::run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
