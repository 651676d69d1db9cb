//! # Status and Config Commands
//!
//! Read-only commands that print JSON.

use guardia_core::{NfcTech, RadioCapability, ScanView};
use serde::Serialize;
use tracing::debug;

use super::Reply;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::state::{ConfigState, ScannerState};

/// Snapshot printed by `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub device_name: String,
    pub capability: RadioCapability,
    /// Technology the radio currently holds, if any
    pub held_technology: Option<NfcTech>,
    /// Technologies handed out since startup
    pub acquisitions: u32,
    pub view: ScanView,
}

/// Shows the scanner state.
pub fn status(scanner: &ScannerState, config: &ConfigState) -> AppResult<Reply> {
    debug!("status command");
    let report = StatusReport {
        device_name: config.device_name.clone(),
        capability: scanner.controller().capability(),
        held_technology: scanner.radio().held_technology(),
        acquisitions: scanner.radio().stats().acquisitions,
        view: scanner.view(&config.unknown_tag_label),
    };
    to_json(&report)
}

/// Shows the loaded configuration.
pub fn show(config: &ConfigState) -> AppResult<Reply> {
    debug!("config command");
    to_json(config)
}

fn to_json(value: &impl Serialize) -> AppResult<Reply> {
    serde_json::to_value(value)
        .map(Reply::Json)
        .map_err(|e| AppError::new(ErrorCode::ConfigError, e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guardia_nfc::{NoOpEmitter, ScannerConfig, SimulatedRadio};

    use super::*;

    #[tokio::test]
    async fn test_status_reports_view_and_capability() {
        let scanner = ScannerState::new(
            Arc::new(SimulatedRadio::default()),
            &ScannerConfig::default(),
            Arc::new(NoOpEmitter),
        );
        let config = ConfigState::default();

        let Reply::Json(before) = status(&scanner, &config).unwrap() else {
            panic!("status must reply with JSON");
        };
        assert_eq!(before["capability"]["status"], "unprobed");
        assert_eq!(before["view"]["mode"], "idle");
        assert_eq!(before["view"]["primaryAction"], "read");

        scanner.controller().initialize().await.unwrap();
        let Reply::Json(after) = status(&scanner, &config).unwrap() else {
            panic!("status must reply with JSON");
        };
        assert_eq!(after["capability"]["status"], "ready");
        assert_eq!(after["heldTechnology"], serde_json::Value::Null);
        assert_eq!(after["deviceName"], "Guard Scanner");
    }

    #[test]
    fn test_config_is_json() {
        let Reply::Json(json) = show(&ConfigState::default()).unwrap() else {
            panic!("config must reply with JSON");
        };
        assert_eq!(json["schoolName"], "IES San Juan de la Rambla");
    }
}
