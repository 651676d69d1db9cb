//! # Error Types
//!
//! Domain-specific error types for guardia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  guardia-core errors (this file)                                       │
//! │  ├── CoreError        - Illegal state transitions, stale sessions      │
//! │  └── ValidationError  - Tag ID and config value failures               │
//! │                                                                         │
//! │  guardia-nfc errors (separate crate)                                   │
//! │  ├── RadioError       - Hardware layer failures                        │
//! │  ├── InitError        - Probe / subsystem start outcomes               │
//! │  └── ScanError        - What a scan attempt returns                    │
//! │                                                                         │
//! │  Flow: RadioError → ScanError → state transition + notice → UI         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::state::ScanStateKind;

// =============================================================================
// Core Error
// =============================================================================

/// Scan-session domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The event is not legal in the current state.
    ///
    /// ## When This Occurs
    /// - Starting a scan while another one is in progress
    /// - Resetting while no result is displayed
    /// - Reporting a tag read while idle
    #[error("Cannot apply {event} while {from}")]
    InvalidTransition {
        from: ScanStateKind,
        event: &'static str,
    },

    /// An event refers to a session that is no longer the active one.
    ///
    /// ## When This Occurs
    /// A tag read completes after the user cancelled and started a new scan.
    /// The late read belongs to the old session and must be discarded.
    #[error("Event for session {actual} does not match active session {expected}")]
    StaleSession { expected: Uuid, actual: Uuid },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the error only signals an event arriving too late.
    pub fn is_stale(&self) -> bool {
        matches!(self, CoreError::StaleSession { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} bytes")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-hex tag id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields that must differ hold the same value.
    #[error("{first} and {second} must differ")]
    Conflict { first: String, second: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
