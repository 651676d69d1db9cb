//! # guardia-core: Pure Scan-Session Logic
//!
//! This crate is the **heart** of the guard scanner. It describes what a scan
//! session is and which state changes are legal, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Guardia Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front end (screen / console)                 │   │
//! │  │      Read card ──► Reading chip... ──► Card detected ──► Next   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ScanView                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               guardia-nfc (ScanSessionController)               │   │
//! │  │      initialize, start_scan, cancel, reset, teardown           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ guardia-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   state   │  │   view    │  │ validation│  │   │
//! │  │   │  TagId    │  │ ScanState │  │ ScanView  │  │  tag ids  │  │   │
//! │  │   │  NfcTech  │  │ ScanEvent │  │  TagCard  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO RADIO • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (TagId, NfcTech, TagReadResult, etc.)
//! - [`state`] - The scan state machine and its transition table
//! - [`view`] - Screen projection of the current state
//! - [`error`] - Domain error types
//! - [`validation`] - Tag identifier normalization
//!
//! ## Example Usage
//!
//! ```rust
//! use guardia_core::{NfcTech, ScanEvent, ScanSession, ScanState, ScanStateKind};
//!
//! let session = ScanSession::new(NfcTech::Ndef);
//! let state = ScanState::Idle.apply(ScanEvent::Started(session.clone())).unwrap();
//! assert_eq!(state.kind(), ScanStateKind::Scanning);
//!
//! let state = state.apply(ScanEvent::Cancelled { session_id: session.id }).unwrap();
//! assert_eq!(state.kind(), ScanStateKind::Idle);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod state;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use state::{ScanEvent, ScanState, ScanStateKind};
pub use types::*;
pub use view::{PrimaryAction, ScanView, TagCard};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest tag identifier accepted, in bytes.
///
/// ISO 14443 UIDs are 4, 7 or 10 bytes; FeliCa IDm and ISO 15693 UIDs are 8.
/// 16 leaves room for vendor formats without accepting arbitrary payloads.
pub const MAX_TAG_ID_BYTES: usize = 16;

/// Label shown when a tag presents no identifier.
pub const UNKNOWN_TAG_LABEL: &str = "Unknown";
