//! # NFC Error Types
//!
//! Error types for the radio layer and the scan controller.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NFC Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   RadioError    │  │    InitError    │  │       ScanError         │ │
//! │  │  (hardware)     │  │  (initialize)   │  │     (start_scan)        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ProbeFailed    │  │  Unsupported    │  │  Cancelled(reason)      │ │
//! │  │  SubsystemStart │  │  Initialization │  │  Failed(ScanFailure)    │ │
//! │  │  Acquisition    │  │  Failure        │  │  Busy                   │ │
//! │  │  Read / Release │  │  Busy/Disposed  │  │  InvalidState           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   ConfigError   │  scanner.toml load/save/validation               │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  RadioError never reaches the UI directly: the controller folds it     │
//! │  into an InitError or a ScanFailure.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use guardia_core::{NfcTech, ScanStateKind, ValidationError};
use thiserror::Error;

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type alias for radio operations.
pub type RadioResult<T> = Result<T, RadioError>;

/// Result type alias for scan attempts.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Radio Error
// =============================================================================

/// Failures reported by an [`NfcRadio`](crate::radio::NfcRadio) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    /// Asking the host whether NFC exists failed.
    #[error("NFC support probe failed: {0}")]
    ProbeFailed(String),

    /// Hardware is present but the subsystem would not start.
    #[error("NFC subsystem failed to start: {0}")]
    SubsystemStart(String),

    /// The host refused the requested technology.
    #[error("Could not acquire {tech}: {reason}")]
    Acquisition { tech: NfcTech, reason: String },

    /// Reading the tag in the field failed.
    #[error("Tag read failed: {0}")]
    Read(String),

    /// Releasing the technology failed.
    #[error("Technology release failed: {0}")]
    Release(String),

    /// The radio went away (disabled, detached).
    #[error("NFC radio unavailable")]
    Unavailable,

    /// A technology is already held.
    #[error("NFC radio is busy")]
    Busy,
}

// =============================================================================
// Init Error
// =============================================================================

/// Outcome of [`initialize`](crate::controller::ScanSessionController::initialize)
/// when the radio is not ready.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// No NFC hardware, or the probe itself failed.
    #[error("This device does not support NFC")]
    UnsupportedHardware,

    /// Hardware exists but the subsystem did not start.
    #[error("NFC initialization failed: {0}")]
    InitializationFailure(String),

    /// A scan is in progress; reinitialization must wait.
    #[error("Cannot reinitialize while scanning")]
    Busy,

    /// The controller was torn down.
    #[error("Scanner has been shut down")]
    Disposed,
}

// =============================================================================
// Scan Error
// =============================================================================

/// Why a scan was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// `cancel()` was called.
    User,
    /// No tag appeared within the configured timeout.
    Timeout,
    /// The controller was torn down mid-scan.
    Teardown,
    /// The caller stopped waiting (scan future dropped).
    Dropped,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::User => write!(f, "cancelled by user"),
            CancelReason::Timeout => write!(f, "timed out"),
            CancelReason::Teardown => write!(f, "scanner shut down"),
            CancelReason::Dropped => write!(f, "caller went away"),
        }
    }
}

/// Why a scan failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanFailure {
    #[error("NFC hardware not supported")]
    UnsupportedHardware,

    #[error("Scanner not initialized")]
    NotInitialized,

    #[error("NFC radio degraded: {0}")]
    Degraded(String),

    /// Both the primary and the fallback technology were refused.
    #[error("No technology could be acquired (primary: {primary}; fallback: {})",
        .fallback.as_deref().unwrap_or("none configured"))]
    AcquisitionFailed {
        primary: String,
        fallback: Option<String>,
    },

    #[error("{0}")]
    ReadFailed(String),

    #[error("Scanner has been shut down")]
    Disposed,
}

/// Error returned by [`start_scan`](crate::controller::ScanSessionController::start_scan).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Scan cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("Scan failed: {0}")]
    Failed(#[from] ScanFailure),

    /// A scan is already running. Nothing was acquired.
    #[error("A scan is already in progress")]
    Busy,

    /// The controller is in a state that does not accept a scan.
    #[error("Cannot start a scan while {0}")]
    InvalidState(ScanStateKind),
}

// =============================================================================
// Error Categorization (for UI policy)
// =============================================================================

impl ScanError {
    /// Returns true if the scan ended through the cancellation path.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ScanError::Cancelled(_))
    }

    /// Returns true if trying again might succeed without operator action.
    ///
    /// ## Retryable
    /// - Timeouts
    /// - Acquisition or read failures (tag moved away, radio contended)
    ///
    /// ## Not Retryable
    /// - Missing or degraded hardware
    /// - A disposed controller
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScanError::Cancelled(CancelReason::Timeout)
                | ScanError::Failed(ScanFailure::AcquisitionFailed { .. })
                | ScanError::Failed(ScanFailure::ReadFailed(_))
        )
    }

    /// Returns true if the screen should simply go back to idle without a notice.
    ///
    /// Failed and cancelled reads are not announced; missing hardware is
    /// announced once by `initialize`.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            ScanError::Cancelled(_)
                | ScanError::Busy
                | ScanError::Failed(ScanFailure::AcquisitionFailed { .. })
                | ScanError::Failed(ScanFailure::ReadFailed(_))
        )
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid scanner configuration: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_categories() {
        assert!(ScanError::Cancelled(CancelReason::User).is_cancellation());
        assert!(ScanError::Cancelled(CancelReason::Timeout).is_retryable());
        assert!(!ScanError::Cancelled(CancelReason::User).is_retryable());

        let unsupported = ScanError::Failed(ScanFailure::UnsupportedHardware);
        assert!(!unsupported.is_retryable());
        assert!(!unsupported.is_silent());

        let acquisition = ScanError::Failed(ScanFailure::AcquisitionFailed {
            primary: "refused".into(),
            fallback: Some("refused".into()),
        });
        assert!(acquisition.is_retryable());
        assert!(acquisition.is_silent());
    }

    #[test]
    fn test_error_display() {
        let err = RadioError::Acquisition {
            tech: NfcTech::NfcA,
            reason: "tag lost".into(),
        };
        assert_eq!(err.to_string(), "Could not acquire nfc_a: tag lost");

        let err = ScanFailure::AcquisitionFailed {
            primary: "x".into(),
            fallback: None,
        };
        assert!(err.to_string().contains("none configured"));

        let err = ScanError::InvalidState(ScanStateKind::Result);
        assert_eq!(err.to_string(), "Cannot start a scan while result");
    }

    #[test]
    fn test_failure_converts_to_scan_error() {
        let err: ScanError = ScanFailure::Disposed.into();
        assert_eq!(err, ScanError::Failed(ScanFailure::Disposed));
    }
}
