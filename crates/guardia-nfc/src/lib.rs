//! # guardia-nfc: Scan Session Controller for Guardia
//!
//! This crate owns every interaction with the NFC radio. The scan screen talks
//! to a [`ScanSessionController`]; the controller talks to an [`NfcRadio`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Scan Controller Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Front end (console, screen)                      │  │
//! │  │   initialize() once • start_scan() on tap • cancel() / reset()   │  │
//! │  └───────────────┬─────────────────────────────▲────────────────────┘  │
//! │                  │                             │ watch<ScanState>       │
//! │                  ▼                             │ ScanEventEmitter       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  ScanSessionController                           │  │
//! │  │                                                                  │  │
//! │  │  ScanState (guardia-core) • TechnologyLease • cancel channel     │  │
//! │  │  One session at a time, stale reads discarded by session id      │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │ Arc<dyn NfcRadio>                    │
//! │                                  ▼                                      │
//! │  ┌────────────────┐   ┌────────────────────────────────────────────┐  │
//! │  │ SimulatedRadio │   │ platform radio (implements NfcRadio)       │  │
//! │  └────────────────┘   └────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`controller`] - `ScanSessionController` and its settings
//! - [`radio`] - `NfcRadio` trait and `TechnologyLease`
//! - [`simulated`] - In-process radio for the console and tests
//! - [`events`] - Emitter trait and operator notices
//! - [`config`] - `scanner.toml` loading
//! - [`error`] - Radio, init, scan and config errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use guardia_nfc::{ScanSessionController, ScanSettings, ScannerConfig, SimulatedRadio};
//!
//! let config = ScannerConfig::load_or_default(None);
//! let controller = ScanSessionController::new(
//!     Arc::new(SimulatedRadio::default()),
//!     ScanSettings::from(&config.scan),
//! );
//!
//! controller.initialize().await?;
//! let result = controller.start_scan().await?;
//! println!("ID: {}", result.display_id(&config.display.unknown_tag_label));
//! controller.reset();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod radio;
pub mod simulated;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ScannerConfig;
pub use controller::{ScanSessionController, ScanSettings};
pub use error::{
    CancelReason, ConfigError, ConfigResult, InitError, RadioError, RadioResult, ScanError,
    ScanFailure, ScanResult,
};
pub use events::{NoOpEmitter, Notice, ScanEventEmitter};
pub use radio::{NfcRadio, TechnologyLease};
pub use simulated::{RadioStats, SimulatedRadio, SimulatedRadioConfig};
