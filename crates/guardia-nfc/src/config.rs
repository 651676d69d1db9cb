//! # Scanner Configuration
//!
//! Configuration management for the guard scanner.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GUARDIA_PRIMARY_TECH=ndef                                          │
//! │     GUARDIA_FALLBACK_TECH=nfc_a   (or "none")                          │
//! │     GUARDIA_SCAN_TIMEOUT_SECS=30                                       │
//! │     GUARDIA_DEVICE_NAME="Puerta principal"                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $GUARDIA_CONFIG, or                                                │
//! │     ~/.config/guardia/scanner.toml (Linux)                             │
//! │     ~/Library/Application Support/org.guardia.guardia/scanner.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Ndef with NfcA fallback, 30 second timeout                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! [device]
//! name = "Puerta principal"
//!
//! [scan]
//! primary_tech = "ndef"
//! fallback_tech = "nfc_a"
//! use_fallback = true
//! scan_timeout_secs = 30   # 0 = wait forever
//!
//! [display]
//! school_name = "IES San Juan de la Rambla"
//! unknown_tag_label = "Unknown"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use guardia_core::validation::validate_scan_timeout_secs;
use guardia_core::{NfcTech, ValidationError, UNKNOWN_TAG_LABEL};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "GUARDIA_CONFIG";

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this scanner device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Human-readable name (e.g., "Puerta principal", "Gimnasio").
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Guard Scanner".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Scan Configuration
// =============================================================================

/// How scans acquire the radio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Technology requested first.
    #[serde(default = "default_primary_tech")]
    pub primary_tech: NfcTech,

    /// Technology requested if the primary is refused.
    #[serde(default = "default_fallback_tech")]
    pub fallback_tech: NfcTech,

    /// Whether to try `fallback_tech` at all.
    #[serde(default = "default_true")]
    pub use_fallback: bool,

    /// Seconds to wait for a tag before giving up (0 = no limit).
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,
}

fn default_primary_tech() -> NfcTech {
    NfcTech::Ndef
}

fn default_fallback_tech() -> NfcTech {
    NfcTech::NfcA
}

fn default_true() -> bool {
    true
}

fn default_scan_timeout_secs() -> u64 {
    30
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            primary_tech: default_primary_tech(),
            fallback_tech: default_fallback_tech(),
            use_fallback: default_true(),
            scan_timeout_secs: default_scan_timeout_secs(),
        }
    }
}

impl ScanConfig {
    /// Fallback technology, if enabled.
    pub fn fallback(&self) -> Option<NfcTech> {
        self.use_fallback.then_some(self.fallback_tech)
    }

    /// Scan timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.scan_timeout_secs > 0).then(|| Duration::from_secs(self.scan_timeout_secs))
    }
}

// =============================================================================
// Display Configuration
// =============================================================================

/// Text shown on the scan screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Shown in the screen header.
    #[serde(default = "default_school_name")]
    pub school_name: String,

    /// Shown instead of a tag id when the tag presents none.
    #[serde(default = "default_unknown_tag_label")]
    pub unknown_tag_label: String,
}

fn default_school_name() -> String {
    "IES San Juan de la Rambla".to_string()
}

fn default_unknown_tag_label() -> String {
    UNKNOWN_TAG_LABEL.to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            school_name: default_school_name(),
            unknown_tag_label: default_unknown_tag_label(),
        }
    }
}

// =============================================================================
// Scanner Configuration
// =============================================================================

/// Complete scanner configuration (`scanner.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl ScannerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$GUARDIA_CONFIG`, or the platform default)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::resolve_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::resolve_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.device.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "device.name".into(),
            }
            .into());
        }

        if self.scan.use_fallback && self.scan.primary_tech == self.scan.fallback_tech {
            return Err(ValidationError::Conflict {
                first: "scan.primary_tech".into(),
                second: "scan.fallback_tech".into(),
            }
            .into());
        }

        validate_scan_timeout_secs(self.scan.scan_timeout_secs)?;

        if self.display.unknown_tag_label.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "display.unknown_tag_label".into(),
            }
            .into());
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup` (environment variable names as keys).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("GUARDIA_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Some(tech) = lookup("GUARDIA_PRIMARY_TECH") {
            match tech.parse() {
                Ok(parsed) => {
                    debug!(tech = %parsed, "Overriding primary technology from environment");
                    self.scan.primary_tech = parsed;
                }
                Err(e) => warn!(value = %tech, error = %e, "Ignoring GUARDIA_PRIMARY_TECH"),
            }
        }

        if let Some(tech) = lookup("GUARDIA_FALLBACK_TECH") {
            if tech.eq_ignore_ascii_case("none") {
                debug!("Fallback technology disabled from environment");
                self.scan.use_fallback = false;
            } else {
                match tech.parse() {
                    Ok(parsed) => {
                        debug!(tech = %parsed, "Overriding fallback technology from environment");
                        self.scan.fallback_tech = parsed;
                        self.scan.use_fallback = true;
                    }
                    Err(e) => warn!(value = %tech, error = %e, "Ignoring GUARDIA_FALLBACK_TECH"),
                }
            }
        }

        if let Some(secs) = lookup("GUARDIA_SCAN_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                debug!(secs = s, "Overriding scan timeout from environment");
                self.scan.scan_timeout_secs = s;
            }
        }
    }

    /// Returns the config file path: `$GUARDIA_CONFIG`, else the platform default.
    fn resolve_config_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_config_path)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "guardia", "guardia")
            .map(|dirs| dirs.config_dir().join("scanner.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.scan.primary_tech, NfcTech::Ndef);
        assert_eq!(config.scan.fallback(), Some(NfcTech::NfcA));
        assert_eq!(config.scan.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.display.unknown_tag_label, "Unknown");
        assert_eq!(config.display.school_name, "IES San Juan de la Rambla");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScannerConfig::default();
        config.scan.fallback_tech = NfcTech::Ndef;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::Conflict { .. }))
        ));

        // Same tech is fine once the fallback is off
        config.scan.use_fallback = false;
        assert!(config.validate().is_ok());

        config.scan.scan_timeout_secs = 3600;
        assert!(config.validate().is_err());

        config.scan.scan_timeout_secs = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.timeout(), None);

        config.display.unknown_tag_label = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ScannerConfig::default();
        config.apply_overrides(lookup(&[
            ("GUARDIA_PRIMARY_TECH", "nfc_a"),
            ("GUARDIA_FALLBACK_TECH", "iso-dep"),
            ("GUARDIA_SCAN_TIMEOUT_SECS", "5"),
            ("GUARDIA_DEVICE_NAME", "Gimnasio"),
        ]));
        assert_eq!(config.scan.primary_tech, NfcTech::NfcA);
        assert_eq!(config.scan.fallback(), Some(NfcTech::IsoDep));
        assert_eq!(config.scan.scan_timeout_secs, 5);
        assert_eq!(config.device.name, "Gimnasio");

        config.apply_overrides(lookup(&[
            ("GUARDIA_FALLBACK_TECH", "none"),
            ("GUARDIA_PRIMARY_TECH", "bluetooth"),
        ]));
        assert_eq!(config.scan.fallback(), None);
        assert_eq!(config.scan.primary_tech, NfcTech::NfcA);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScannerConfig = toml::from_str(
            r#"
            [scan]
            primary_tech = "nfc_a"
            fallback_tech = "ndef"
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.primary_tech, NfcTech::NfcA);
        assert_eq!(config.scan.scan_timeout_secs, 30);
        assert_eq!(config.device.name, "Guard Scanner");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scanner.toml");

        let mut config = ScannerConfig::default();
        config.device.name = "Puerta principal".into();
        config.scan.scan_timeout_secs = 12;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[device]"));
        assert!(contents.contains("[scan]"));

        let loaded: ScannerConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.device.name, "Puerta principal");
        assert_eq!(loaded.scan.scan_timeout_secs, 12);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scanner.toml");
        std::fs::write(&path, "[scan]\nprimary_tech = \"carrier_pigeon\"\n").unwrap();

        assert!(matches!(
            ScannerConfig::load(Some(path.clone())),
            Err(ConfigError::LoadFailed(_))
        ));
        assert_eq!(
            ScannerConfig::load_or_default(Some(path)).scan.primary_tech,
            NfcTech::Ndef
        );
    }
}
