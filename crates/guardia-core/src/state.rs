//! # Scan State Machine
//!
//! The lifecycle of a single NFC read attempt as an explicit tagged enum.
//! Impossible combinations (scanning while a result is shown, a result with
//! no session) cannot be represented.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scan State Transitions                             │
//! │                                                                         │
//! │              ProbeUnsupported                                           │
//! │   ┌──────┐ ─────────────────────────────────────────► ┌─────────────┐  │
//! │   │ Idle │                                             │ Unsupported │  │
//! │   └──┬───┘ ◄───────────────────────────────────────── └─────────────┘  │
//! │      │  ▲            ProbeSucceeded (reinitialize)                      │
//! │      │  │                                                               │
//! │ Started │ Cancelled / Failed (same session)                             │
//! │      │  │                                                               │
//! │      ▼  │                                                               │
//! │   ┌──────────┐   TagRead (same session)   ┌────────┐                   │
//! │   │ Scanning │ ─────────────────────────► │ Result │                   │
//! │   └──────────┘                            └───┬────┘                   │
//! │                                               │ Reset                   │
//! │                                               ▼                         │
//! │                                            ┌──────┐                     │
//! │                                            │ Idle │                     │
//! │                                            └──────┘                     │
//! │                                                                         │
//! │  TornDown: every state except Unsupported returns to Idle.             │
//! │  Events naming another session are rejected as stale.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::types::{ScanSession, TagReadResult};

// =============================================================================
// Scan State
// =============================================================================

/// Current state of the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Ready to start a scan.
    #[default]
    Idle,
    /// Technology acquired, waiting for a tag.
    Scanning(ScanSession),
    /// A tag was read; shown until reset.
    Result(TagReadResult),
    /// No usable NFC hardware. Terminal until reinitialized.
    Unsupported,
}

/// Discriminant of [`ScanState`], for logging and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ScanStateKind {
    Idle,
    Scanning,
    Result,
    Unsupported,
}

impl std::fmt::Display for ScanStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStateKind::Idle => write!(f, "idle"),
            ScanStateKind::Scanning => write!(f, "scanning"),
            ScanStateKind::Result => write!(f, "result"),
            ScanStateKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

// =============================================================================
// Scan Events
// =============================================================================

/// Everything that can move the scanner between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Hardware probe succeeded (subsystem may still have failed to start).
    ProbeSucceeded,
    /// Hardware probe failed or reported no NFC support.
    ProbeUnsupported,
    /// A technology was acquired for a new session.
    Started(ScanSession),
    /// A tag was read in the given result's session.
    TagRead(TagReadResult),
    /// The session was cancelled (user, timeout, dropped caller).
    Cancelled { session_id: Uuid },
    /// The session ended with an error.
    Failed { session_id: Uuid },
    /// The displayed result was dismissed.
    Reset,
    /// The controller is being disposed.
    TornDown,
}

impl ScanEvent {
    /// Short name used in logs and errors.
    pub const fn name(&self) -> &'static str {
        match self {
            ScanEvent::ProbeSucceeded => "probe_succeeded",
            ScanEvent::ProbeUnsupported => "probe_unsupported",
            ScanEvent::Started(_) => "start",
            ScanEvent::TagRead(_) => "tag_read",
            ScanEvent::Cancelled { .. } => "cancel",
            ScanEvent::Failed { .. } => "fail",
            ScanEvent::Reset => "reset",
            ScanEvent::TornDown => "teardown",
        }
    }
}

// =============================================================================
// Transitions
// =============================================================================

impl ScanState {
    /// Returns the discriminant of this state.
    pub fn kind(&self) -> ScanStateKind {
        match self {
            ScanState::Idle => ScanStateKind::Idle,
            ScanState::Scanning(_) => ScanStateKind::Scanning,
            ScanState::Result(_) => ScanStateKind::Result,
            ScanState::Unsupported => ScanStateKind::Unsupported,
        }
    }

    /// Returns the active session, if scanning.
    pub fn session(&self) -> Option<&ScanSession> {
        match self {
            ScanState::Scanning(session) => Some(session),
            _ => None,
        }
    }

    /// Returns the displayed result, if any.
    pub fn result(&self) -> Option<&TagReadResult> {
        match self {
            ScanState::Result(result) => Some(result),
            _ => None,
        }
    }

    /// Returns true while a scan is in progress.
    pub fn is_scanning(&self) -> bool {
        matches!(self, ScanState::Scanning(_))
    }

    /// Computes the state that follows `event`.
    ///
    /// ## Errors
    /// - `InvalidTransition` if the event is not legal here
    /// - `StaleSession` if the event names a session other than the active one
    pub fn apply(&self, event: ScanEvent) -> CoreResult<ScanState> {
        let invalid = |event: &ScanEvent| CoreError::InvalidTransition {
            from: self.kind(),
            event: event.name(),
        };

        match (self, event) {
            // Probe outcomes never interrupt a running session.
            (ScanState::Scanning(_), event @ ScanEvent::ProbeSucceeded)
            | (ScanState::Scanning(_), event @ ScanEvent::ProbeUnsupported) => {
                Err(invalid(&event))
            }
            (_, ScanEvent::ProbeSucceeded) => Ok(ScanState::Idle),
            (_, ScanEvent::ProbeUnsupported) => Ok(ScanState::Unsupported),

            (ScanState::Idle, ScanEvent::Started(session)) => Ok(ScanState::Scanning(session)),
            (_, event @ ScanEvent::Started(_)) => Err(invalid(&event)),

            (ScanState::Scanning(active), ScanEvent::TagRead(result)) => {
                ensure_same_session(active, result.session_id)?;
                Ok(ScanState::Result(result))
            }
            (_, event @ ScanEvent::TagRead(_)) => Err(invalid(&event)),

            (ScanState::Scanning(active), ScanEvent::Cancelled { session_id })
            | (ScanState::Scanning(active), ScanEvent::Failed { session_id }) => {
                ensure_same_session(active, session_id)?;
                Ok(ScanState::Idle)
            }
            (_, event @ ScanEvent::Cancelled { .. }) | (_, event @ ScanEvent::Failed { .. }) => {
                Err(invalid(&event))
            }

            (ScanState::Result(_), ScanEvent::Reset) => Ok(ScanState::Idle),
            (_, event @ ScanEvent::Reset) => Err(invalid(&event)),

            (ScanState::Unsupported, ScanEvent::TornDown) => Ok(ScanState::Unsupported),
            (_, ScanEvent::TornDown) => Ok(ScanState::Idle),
        }
    }
}

fn ensure_same_session(active: &ScanSession, session_id: Uuid) -> CoreResult<()> {
    if active.id != session_id {
        return Err(CoreError::StaleSession {
            expected: active.id,
            actual: session_id,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NfcTech, TagId, TagMetadata};

    fn scanning() -> (ScanState, ScanSession) {
        let session = ScanSession::new(NfcTech::Ndef);
        (ScanState::Scanning(session.clone()), session)
    }

    fn result_for(session: &ScanSession) -> TagReadResult {
        TagReadResult::from_metadata(
            session,
            TagMetadata::with_id(TagId::parse("04AABBCC").unwrap()),
        )
    }

    #[test]
    fn test_full_cycle() {
        let session = ScanSession::new(NfcTech::NfcA);
        let state = ScanState::Idle
            .apply(ScanEvent::Started(session.clone()))
            .unwrap();
        assert!(state.is_scanning());

        let state = state.apply(ScanEvent::TagRead(result_for(&session))).unwrap();
        assert_eq!(state.kind(), ScanStateKind::Result);
        assert_eq!(state.result().unwrap().tag_id(), Some("04AABBCC"));

        let state = state.apply(ScanEvent::Reset).unwrap();
        assert_eq!(state, ScanState::Idle);
        assert!(state.result().is_none());
    }

    #[test]
    fn test_start_only_from_idle() {
        let (state, _) = scanning();
        let err = state
            .apply(ScanEvent::Started(ScanSession::new(NfcTech::Ndef)))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: ScanStateKind::Scanning,
                ..
            }
        ));

        assert!(ScanState::Unsupported
            .apply(ScanEvent::Started(ScanSession::new(NfcTech::Ndef)))
            .is_err());
    }

    #[test]
    fn test_cancel_and_fail_return_to_idle() {
        let (state, session) = scanning();
        assert_eq!(
            state
                .apply(ScanEvent::Cancelled {
                    session_id: session.id
                })
                .unwrap(),
            ScanState::Idle
        );
        assert_eq!(
            state
                .apply(ScanEvent::Failed {
                    session_id: session.id
                })
                .unwrap(),
            ScanState::Idle
        );
    }

    #[test]
    fn test_stale_events_rejected() {
        let (state, _) = scanning();
        let old = ScanSession::new(NfcTech::Ndef);

        let err = state.apply(ScanEvent::TagRead(result_for(&old))).unwrap_err();
        assert!(err.is_stale());

        let err = state
            .apply(ScanEvent::Cancelled { session_id: old.id })
            .unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_tag_read_outside_scanning_is_invalid() {
        let session = ScanSession::new(NfcTech::Ndef);
        let err = ScanState::Idle
            .apply(ScanEvent::TagRead(result_for(&session)))
            .unwrap_err();
        assert!(!err.is_stale());
    }

    #[test]
    fn test_reset_only_from_result() {
        assert!(ScanState::Idle.apply(ScanEvent::Reset).is_err());
        assert!(ScanState::Unsupported.apply(ScanEvent::Reset).is_err());
        let (state, _) = scanning();
        assert!(state.apply(ScanEvent::Reset).is_err());
    }

    #[test]
    fn test_probe_outcomes() {
        assert_eq!(
            ScanState::Idle.apply(ScanEvent::ProbeUnsupported).unwrap(),
            ScanState::Unsupported
        );
        assert_eq!(
            ScanState::Unsupported
                .apply(ScanEvent::ProbeSucceeded)
                .unwrap(),
            ScanState::Idle
        );
        let (state, _) = scanning();
        assert!(state.apply(ScanEvent::ProbeSucceeded).is_err());
        assert!(state.apply(ScanEvent::ProbeUnsupported).is_err());
    }

    #[test]
    fn test_teardown() {
        let (state, _) = scanning();
        assert_eq!(state.apply(ScanEvent::TornDown).unwrap(), ScanState::Idle);
        assert_eq!(
            ScanState::Unsupported.apply(ScanEvent::TornDown).unwrap(),
            ScanState::Unsupported
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ScanStateKind::Scanning.to_string(), "scanning");
        assert_eq!(ScanStateKind::Unsupported.to_string(), "unsupported");
    }
}
