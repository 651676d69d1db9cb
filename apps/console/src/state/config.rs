//! # Configuration State
//!
//! The parts of `scanner.toml` the console shows to the operator.
//!
//! ## Thread Safety
//! Configuration is read-only after startup, so no mutex needed.

use guardia_core::NfcTech;
use guardia_nfc::ScannerConfig;
use serde::Serialize;

/// Read-only view of the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Name of this scanner (e.g., "Puerta principal")
    pub device_name: String,

    /// Shown in the screen header
    pub school_name: String,

    /// Shown when a tag presents no identifier
    pub unknown_tag_label: String,

    /// Technology requested first
    pub primary_tech: NfcTech,

    /// Technology requested if the primary is refused
    pub fallback_tech: Option<NfcTech>,

    /// Seconds before an unanswered scan is cancelled (0 = never)
    pub scan_timeout_secs: u64,
}

impl ConfigState {
    /// Header line printed above every frame.
    pub fn header(&self) -> String {
        format!("{} · {}", self.school_name, self.device_name)
    }
}

impl From<&ScannerConfig> for ConfigState {
    fn from(config: &ScannerConfig) -> Self {
        ConfigState {
            device_name: config.device.name.clone(),
            school_name: config.display.school_name.clone(),
            unknown_tag_label: config.display.unknown_tag_label.clone(),
            primary_tech: config.scan.primary_tech,
            fallback_tech: config.scan.fallback(),
            scan_timeout_secs: config.scan.scan_timeout_secs,
        }
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::from(&ScannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_scanner_config() {
        let config = ConfigState::default();
        assert_eq!(config.primary_tech, NfcTech::Ndef);
        assert_eq!(config.fallback_tech, Some(NfcTech::NfcA));
        assert_eq!(config.unknown_tag_label, "Unknown");
        assert_eq!(config.header(), "IES San Juan de la Rambla · Guard Scanner");
    }

    #[test]
    fn test_disabled_fallback_is_none() {
        let mut scanner = ScannerConfig::default();
        scanner.scan.use_fallback = false;
        assert_eq!(ConfigState::from(&scanner).fallback_tech, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(ConfigState::default()).unwrap();
        assert_eq!(json["primaryTech"], "ndef");
        assert_eq!(json["fallbackTech"], "nfc_a");
        assert_eq!(json["scanTimeoutSecs"], 30);
    }
}
