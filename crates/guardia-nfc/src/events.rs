//! # Scanner Events
//!
//! What the controller pushes to the front end besides its `watch` channel:
//! every state change, and one-time notices about the hardware.

use guardia_core::ScanState;
use serde::Serialize;

use crate::error::InitError;

/// A message the operator must see once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Notice {
    /// The device has no usable NFC hardware.
    UnsupportedHardware,
    /// NFC exists but could not be started.
    InitializationFailure { reason: String },
}

impl Notice {
    /// Builds the notice for a failed initialization, if it warrants one.
    pub fn from_init_error(err: &InitError) -> Option<Self> {
        match err {
            InitError::UnsupportedHardware => Some(Notice::UnsupportedHardware),
            InitError::InitializationFailure(reason) => Some(Notice::InitializationFailure {
                reason: reason.clone(),
            }),
            InitError::Busy | InitError::Disposed => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::UnsupportedHardware => "NFC not supported",
            Notice::InitializationFailure { .. } => "NFC unavailable",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::UnsupportedHardware => "This device does not support NFC.".to_string(),
            Notice::InitializationFailure { reason } => {
                format!("NFC could not be started: {}", reason)
            }
        }
    }
}

/// Receives controller events.
///
/// Called after the controller's lock is released, one event at a time, in
/// the order the states were applied. Implementations may call back into the
/// controller; events caused by such a call are delivered after the current
/// one returns.
pub trait ScanEventEmitter: Send + Sync {
    /// The scan state changed.
    fn emit_state(&self, state: &ScanState);

    /// A notice for the operator.
    fn emit_notice(&self, notice: &Notice);

    /// Free-form diagnostic (acquisition refused, read failed).
    fn emit_diagnostic(&self, _message: &str) {}
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl ScanEventEmitter for NoOpEmitter {
    fn emit_state(&self, _state: &ScanState) {}
    fn emit_notice(&self, _notice: &Notice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_from_init_error() {
        assert_eq!(
            Notice::from_init_error(&InitError::UnsupportedHardware),
            Some(Notice::UnsupportedHardware)
        );
        assert!(Notice::from_init_error(&InitError::Disposed).is_none());

        let notice =
            Notice::from_init_error(&InitError::InitializationFailure("no firmware".into()))
                .unwrap();
        assert_eq!(notice.message(), "NFC could not be started: no firmware");
    }

    #[test]
    fn test_notice_serializes_with_kind() {
        let json = serde_json::to_value(Notice::UnsupportedHardware).unwrap();
        assert_eq!(json["kind"], "unsupported_hardware");
    }
}
