//! # Console Error Type
//!
//! Unified error type for console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Console                            │
//! │                                                                         │
//! │  Operator types `tap 04:A2:2B`                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Handler                                                 │  │
//! │  │  Result<Reply, AppError>                                         │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Parse Error? ──── CommandError::UnknownCommand ──┐             │  │
//! │  │         │                                          │             │  │
//! │  │         ▼                                          ▼             │  │
//! │  │  Validation Error? ── ValidationError ─────── AppError ────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Scan Error? ──────── ScanError / InitError ─────────────────── ►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Printed as `error[SCAN_BUSY]: A scan is already in progress`           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use guardia_core::ValidationError;
use guardia_nfc::{ConfigError, InitError, ScanError, ScanFailure};
use serde::Serialize;

use crate::commands::CommandError;

/// Error returned from console commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "SCAN_BUSY",
///   "message": "A scan is already in progress"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for console replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The command line could not be parsed
    InvalidCommand,

    /// Input validation failed (tag id, config value)
    ValidationError,

    /// The device has no usable NFC hardware
    NfcUnsupported,

    /// NFC exists but is not ready
    NfcUnavailable,

    /// A scan is already running
    ScanBusy,

    /// The scanner is not in a state that accepts the command
    InvalidState,

    /// The scan ended without a tag
    ScanFailed,

    /// The scan was cancelled
    ScanCancelled,

    /// scanner.toml could not be read or written
    ConfigError,

    /// The scanner has been shut down
    ShutDown,

    /// Console I/O failed
    Internal,
}

impl AppError {
    /// Creates a new console error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::InvalidState, message)
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::InvalidTagId(e) => AppError::validation(e.to_string()),
            other => AppError::new(ErrorCode::InvalidCommand, other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Converts initialization outcomes to console errors.
impl From<InitError> for AppError {
    fn from(err: InitError) -> Self {
        let code = match &err {
            InitError::UnsupportedHardware => ErrorCode::NfcUnsupported,
            InitError::InitializationFailure(_) => ErrorCode::NfcUnavailable,
            InitError::Busy => ErrorCode::ScanBusy,
            InitError::Disposed => ErrorCode::ShutDown,
        };
        AppError::new(code, err.to_string())
    }
}

/// Converts scan errors to console errors.
impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        let code = match &err {
            ScanError::Cancelled(_) => ErrorCode::ScanCancelled,
            ScanError::Busy => ErrorCode::ScanBusy,
            ScanError::InvalidState(_) => ErrorCode::InvalidState,
            ScanError::Failed(failure) => match failure {
                ScanFailure::UnsupportedHardware => ErrorCode::NfcUnsupported,
                ScanFailure::NotInitialized | ScanFailure::Degraded(_) => {
                    ErrorCode::NfcUnavailable
                }
                ScanFailure::AcquisitionFailed { .. } | ScanFailure::ReadFailed(_) => {
                    ErrorCode::ScanFailed
                }
                ScanFailure::Disposed => ErrorCode::ShutDown,
            },
        };
        AppError::new(code, err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(e) => AppError::validation(e.to_string()),
            other => {
                tracing::error!("Configuration error: {}", other);
                AppError::new(ErrorCode::ConfigError, other.to_string())
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = serde_json::to_value(self.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self.code));
        write!(f, "error[{}]: {}", code, self.message)
    }
}

impl std::error::Error for AppError {}

/// Convenience type alias for command results.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use guardia_core::ScanStateKind;
    use guardia_nfc::CancelReason;

    #[test]
    fn test_scan_error_codes() {
        assert_eq!(AppError::from(ScanError::Busy).code, ErrorCode::ScanBusy);
        assert_eq!(
            AppError::from(ScanError::Cancelled(CancelReason::Timeout)).code,
            ErrorCode::ScanCancelled
        );
        assert_eq!(
            AppError::from(ScanError::InvalidState(ScanStateKind::Result)).code,
            ErrorCode::InvalidState
        );
        assert_eq!(
            AppError::from(ScanError::Failed(ScanFailure::ReadFailed("moved".into()))).code,
            ErrorCode::ScanFailed
        );
        assert_eq!(
            AppError::from(ScanError::Failed(ScanFailure::UnsupportedHardware)).code,
            ErrorCode::NfcUnsupported
        );
    }

    #[test]
    fn test_init_error_codes() {
        assert_eq!(
            AppError::from(InitError::InitializationFailure("firmware".into())).code,
            ErrorCode::NfcUnavailable
        );
        assert_eq!(AppError::from(InitError::Disposed).code, ErrorCode::ShutDown);
    }

    #[test]
    fn test_display_uses_wire_code() {
        let err = AppError::from(ScanError::Busy);
        assert_eq!(
            err.to_string(),
            "error[SCAN_BUSY]: A scan is already in progress"
        );
    }

    #[test]
    fn test_serializes_code_and_message() {
        let err = AppError::validation("tag_id is required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "tag_id is required");
    }
}
