//! # Scan Commands
//!
//! Drive the scan screen: start a scan, present a card to the simulated
//! radio, cancel, dismiss the result, and re-probe the hardware.
//!
//! ## Typical Session
//! ```text
//! scan ──► Scanning ──► tap 04A22B ──► Result ──► next ──► Idle
//!              │
//!              └──► cancel ──► Idle
//! ```

use guardia_core::TagId;
use guardia_nfc::ScanError;
use tracing::{debug, info};

use super::Reply;
use crate::error::{AppError, AppResult};
use crate::state::ScannerState;

/// Starts a scan in the background.
///
/// ## Returns
/// Once the radio is held and the screen shows `Scanning`, or once the
/// attempt has already failed (the failure is printed by the emitter).
pub async fn start(scanner: &ScannerState) -> AppResult<Reply> {
    if scanner.controller().state().is_scanning() {
        return Err(ScanError::Busy.into());
    }
    scanner.spawn_scan().await;
    Ok(Reply::Silent)
}

/// Presents a card to the simulated radio.
///
/// The card is only seen while a scan holds the radio.
pub fn tap(scanner: &ScannerState, tag_id: Option<TagId>) -> AppResult<Reply> {
    let presented = match tag_id {
        Some(id) => {
            debug!(tag_id = %id, "Presenting tag");
            scanner.radio().present_tag(id)
        }
        None => {
            debug!("Presenting anonymous tag");
            scanner.radio().present_anonymous_tag()
        }
    };

    if presented {
        Ok(Reply::Silent)
    } else {
        Err(AppError::invalid_state(
            "No scan in progress, the card was not read",
        ))
    }
}

/// Cancels the scan in progress.
pub fn cancel(scanner: &ScannerState) -> Reply {
    if scanner.controller().cancel() {
        Reply::Silent
    } else {
        Reply::Text("Nothing to cancel.".to_string())
    }
}

/// Dismisses the displayed result.
pub fn next(scanner: &ScannerState) -> Reply {
    if scanner.controller().reset() {
        Reply::Silent
    } else {
        Reply::Text("No result to dismiss.".to_string())
    }
}

/// Probes the NFC hardware again.
pub async fn retry(scanner: &ScannerState) -> AppResult<Reply> {
    scanner.controller().reinitialize().await?;
    info!("NFC radio ready after reinitialization");
    Ok(Reply::Text("NFC ready.".to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guardia_core::ScanStateKind;
    use guardia_nfc::{NoOpEmitter, ScannerConfig, SimulatedRadio, SimulatedRadioConfig};

    use super::*;
    use crate::error::ErrorCode;

    async fn ready_scanner(config: SimulatedRadioConfig) -> ScannerState {
        let scanner = ScannerState::new(
            Arc::new(SimulatedRadio::new(config)),
            &ScannerConfig::default(),
            Arc::new(NoOpEmitter),
        );
        let _ = scanner.controller().initialize().await;
        scanner
    }

    #[tokio::test]
    async fn test_scan_tap_next() {
        let scanner = ready_scanner(SimulatedRadioConfig::default()).await;
        let mut rx = scanner.controller().subscribe();

        assert_eq!(start(&scanner).await.unwrap(), Reply::Silent);
        assert!(scanner.controller().state().is_scanning());

        tap(&scanner, Some(TagId::parse("04A22B").unwrap())).unwrap();
        rx.wait_for(|s| s.result().is_some()).await.unwrap();
        assert_eq!(
            scanner.controller().state().result().unwrap().tag_id(),
            Some("04A22B")
        );

        assert_eq!(next(&scanner), Reply::Silent);
        assert_eq!(scanner.controller().state().kind(), ScanStateKind::Idle);
        assert_eq!(
            next(&scanner),
            Reply::Text("No result to dismiss.".to_string())
        );
    }

    #[tokio::test]
    async fn test_second_scan_is_busy() {
        let scanner = ready_scanner(SimulatedRadioConfig::default()).await;
        start(&scanner).await.unwrap();

        let err = start(&scanner).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ScanBusy);
        assert_eq!(scanner.radio().stats().acquisitions, 1);

        assert_eq!(cancel(&scanner), Reply::Silent);
        assert_eq!(cancel(&scanner), Reply::Text("Nothing to cancel.".to_string()));
        assert_eq!(scanner.radio().stats().releases, 1);
    }

    #[tokio::test]
    async fn test_tap_without_scan_is_rejected() {
        let scanner = ready_scanner(SimulatedRadioConfig::default()).await;
        let err = tap(&scanner, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_retry_after_hardware_appears() {
        let scanner = ready_scanner(SimulatedRadioConfig::unsupported()).await;
        assert_eq!(
            scanner.controller().state().kind(),
            ScanStateKind::Unsupported
        );

        scanner.radio().update_config(|c| c.supported = true);
        assert_eq!(
            retry(&scanner).await.unwrap(),
            Reply::Text("NFC ready.".to_string())
        );
        assert_eq!(scanner.controller().state().kind(), ScanStateKind::Idle);
    }
}
