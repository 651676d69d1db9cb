//! # Console State
//!
//! State shared by the command handlers.
//!
//! ```text
//! ┌──────────────────────────────┐ ┌──────────────────────────┐
//! │ ScannerState                 │ │ ConfigState              │
//! │  • ScanSessionController     │ │  • device / school name  │
//! │  • SimulatedRadio            │ │  • technologies, timeout │
//! │  • background scan task      │ │  • unknown tag label     │
//! └──────────────────────────────┘ └──────────────────────────┘
//! ```

mod config;
mod scanner;

pub use config::ConfigState;
pub use scanner::ScannerState;
