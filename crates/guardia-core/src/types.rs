//! # Domain Types
//!
//! Core domain types used throughout the scanner.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    NfcTech      │   │   ScanSession   │   │  TagReadResult  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Ndef (primary) │   │  id (UUID)      │   │  session_id     │       │
//! │  │  NfcA (fallback)│   │  tech           │   │  tag_id?        │       │
//! │  │  NfcB, NfcF ... │   │  started_at     │   │  tech, read_at  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     TagId       │   │  TagMetadata    │   │ RadioCapability │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  "04AABBCC"     │   │  id?            │   │  Unprobed       │       │
//! │  │  uppercase hex  │   │                 │   │  Ready          │       │
//! │  └─────────────────┘   └─────────────────┘   │  Unsupported    │       │
//! │                                              │  Degraded       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::validation::{normalize_tag_id, ValidationResult};

// =============================================================================
// NFC Technology
// =============================================================================

/// A tag protocol family the radio can be configured for.
///
/// Requesting a technology gives the caller an exclusive session with the
/// radio for that family. `Ndef` is the preferred high-level format; `NfcA`
/// (ISO 14443-3A) is the usual low-level fallback for tags that do not
/// negotiate NDEF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NfcTech {
    Ndef,
    NfcA,
    NfcB,
    NfcF,
    NfcV,
    IsoDep,
    MifareClassic,
    MifareUltralight,
}

impl NfcTech {
    /// All known technologies, in declaration order.
    pub const ALL: [NfcTech; 8] = [
        NfcTech::Ndef,
        NfcTech::NfcA,
        NfcTech::NfcB,
        NfcTech::NfcF,
        NfcTech::NfcV,
        NfcTech::IsoDep,
        NfcTech::MifareClassic,
        NfcTech::MifareUltralight,
    ];

    /// Returns the configuration name of this technology.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NfcTech::Ndef => "ndef",
            NfcTech::NfcA => "nfc_a",
            NfcTech::NfcB => "nfc_b",
            NfcTech::NfcF => "nfc_f",
            NfcTech::NfcV => "nfc_v",
            NfcTech::IsoDep => "iso_dep",
            NfcTech::MifareClassic => "mifare_classic",
            NfcTech::MifareUltralight => "mifare_ultralight",
        }
    }
}

impl std::fmt::Display for NfcTech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NfcTech {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect();

        NfcTech::ALL
            .iter()
            .copied()
            .find(|tech| tech.as_str().replace('_', "") == key)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "technology".to_string(),
                allowed: NfcTech::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Tag Identifier
// =============================================================================

/// Normalized tag identifier: uppercase hexadecimal, no separators.
///
/// ## Accepted Input
/// ```text
/// "04aabbcc"       → "04AABBCC"
/// "04:AA:BB:CC"    → "04AABBCC"
/// "04 aa-bb cc"    → "04AABBCC"
/// ""               → Required
/// "04AAB"          → InvalidFormat (odd length)
/// "ZZ"             → InvalidFormat (not hex)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagId(String);

impl TagId {
    /// Parses and normalizes an identifier reported as text.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        normalize_tag_id(raw).map(TagId)
    }

    /// Builds an identifier from raw UID bytes as read off the air.
    ///
    /// Returns `Ok(None)` for an empty UID (some tags present none). UIDs
    /// longer than [`MAX_TAG_ID_BYTES`](crate::MAX_TAG_ID_BYTES) are
    /// rejected like their text form.
    pub fn from_bytes(bytes: &[u8]) -> ValidationResult<Option<Self>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
        TagId::parse(&hex).map(Some)
    }

    /// Returns the normalized hex string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier length in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.0.len() / 2
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TagId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagId::parse(s)
    }
}

impl TryFrom<String> for TagId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TagId::parse(&value)
    }
}

impl From<TagId> for String {
    fn from(id: TagId) -> Self {
        id.0
    }
}

// =============================================================================
// Tag Metadata
// =============================================================================

/// What the radio reports about a tag once it is in the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMetadata {
    /// Identifier, if the tag presents one.
    pub id: Option<TagId>,
}

impl TagMetadata {
    /// Metadata for a tag with the given identifier.
    pub fn with_id(id: TagId) -> Self {
        TagMetadata { id: Some(id) }
    }

    /// Metadata for a tag that presented no identifier.
    pub fn anonymous() -> Self {
        TagMetadata { id: None }
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// One attempt to read a tag, from acquisition to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSession {
    /// Unique session identifier (UUID v4).
    pub id: Uuid,

    /// Technology acquired for this session.
    pub tech: NfcTech,

    /// When the technology was acquired.
    pub started_at: DateTime<Utc>,
}

impl ScanSession {
    /// Creates a session for a freshly acquired technology.
    pub fn new(tech: NfcTech) -> Self {
        ScanSession {
            id: Uuid::new_v4(),
            tech,
            started_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tag Read Result
// =============================================================================

/// Immutable value produced by a successful scan.
///
/// ## Authorization
/// Nothing here says whether the holder of the tag is allowed anything.
/// Screens may render a green "read" badge from it, but that badge only
/// means a serial number was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReadResult {
    /// Session that produced this result.
    pub session_id: Uuid,

    /// Identifier read from the tag (None if the tag presented none).
    pub tag_id: Option<TagId>,

    /// Technology used to read the tag.
    pub tech: NfcTech,

    /// When the tag was read.
    pub read_at: DateTime<Utc>,
}

impl TagReadResult {
    /// Builds the result for `session` from the radio's metadata.
    pub fn from_metadata(session: &ScanSession, metadata: TagMetadata) -> Self {
        TagReadResult {
            session_id: session.id,
            tag_id: metadata.id,
            tech: session.tech,
            read_at: Utc::now(),
        }
    }

    /// Returns the identifier as a string, if present.
    pub fn tag_id(&self) -> Option<&str> {
        self.tag_id.as_ref().map(TagId::as_str)
    }

    /// Returns the identifier, or `unknown_label` if the tag had none.
    pub fn display_id<'a>(&'a self, unknown_label: &'a str) -> &'a str {
        self.tag_id().unwrap_or(unknown_label)
    }
}

// =============================================================================
// Radio Capability
// =============================================================================

/// Whether the NFC hardware is present and started.
///
/// Probed once per controller; only an explicit reinitialization moves it
/// back to `Unprobed`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RadioCapability {
    /// Not probed yet.
    #[default]
    Unprobed,
    /// Hardware present and subsystem started.
    Ready,
    /// Hardware absent or the probe failed.
    Unsupported,
    /// Hardware present but the subsystem failed to start.
    Degraded { reason: String },
}

impl RadioCapability {
    /// Returns true if scans may be attempted.
    pub fn is_ready(&self) -> bool {
        matches!(self, RadioCapability::Ready)
    }

    /// Returns true once a probe has completed (whatever its outcome).
    pub fn is_probed(&self) -> bool {
        !matches!(self, RadioCapability::Unprobed)
    }
}

impl std::fmt::Display for RadioCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadioCapability::Unprobed => write!(f, "unprobed"),
            RadioCapability::Ready => write!(f, "ready"),
            RadioCapability::Unsupported => write!(f, "unsupported"),
            RadioCapability::Degraded { reason } => write!(f, "degraded ({})", reason),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tech_parsing() {
        assert_eq!("ndef".parse::<NfcTech>().unwrap(), NfcTech::Ndef);
        assert_eq!("NfcA".parse::<NfcTech>().unwrap(), NfcTech::NfcA);
        assert_eq!("nfc-a".parse::<NfcTech>().unwrap(), NfcTech::NfcA);
        assert_eq!("iso_dep".parse::<NfcTech>().unwrap(), NfcTech::IsoDep);
        assert_eq!(
            "MifareUltralight".parse::<NfcTech>().unwrap(),
            NfcTech::MifareUltralight
        );
        assert!("bluetooth".parse::<NfcTech>().is_err());
    }

    #[test]
    fn test_tech_display_matches_serde() {
        for tech in NfcTech::ALL {
            let json = serde_json::to_string(&tech).unwrap();
            assert_eq!(json, format!("\"{}\"", tech));
        }
    }

    #[test]
    fn test_tag_id_from_bytes() {
        let id = TagId::from_bytes(&[0x04, 0xaa, 0xbb, 0xcc]).unwrap().unwrap();
        assert_eq!(id.as_str(), "04AABBCC");
        assert_eq!(id.byte_len(), 4);
        assert_eq!(TagId::from_bytes(&[]), Ok(None));
    }

    #[test]
    fn test_tag_id_from_bytes_enforces_length() {
        let longest = TagId::from_bytes(&[0xab; crate::MAX_TAG_ID_BYTES])
            .unwrap()
            .unwrap();
        assert_eq!(longest.byte_len(), crate::MAX_TAG_ID_BYTES);
        let json = serde_json::to_string(&longest).unwrap();
        assert_eq!(serde_json::from_str::<TagId>(&json).unwrap(), longest);

        assert!(matches!(
            TagId::from_bytes(&[0xab; 17]),
            Err(ValidationError::TooLong { max: 16, .. })
        ));
    }

    #[test]
    fn test_tag_id_serde_validates() {
        let id: TagId = serde_json::from_str("\"04:aa:bb:cc\"").unwrap();
        assert_eq!(id.as_str(), "04AABBCC");
        assert!(serde_json::from_str::<TagId>("\"not-hex\"").is_err());
    }

    #[test]
    fn test_result_display_id() {
        let session = ScanSession::new(NfcTech::NfcA);
        let known = TagReadResult::from_metadata(
            &session,
            TagMetadata::with_id(TagId::parse("04AABBCC").unwrap()),
        );
        assert_eq!(known.tag_id(), Some("04AABBCC"));
        assert_eq!(known.tech, NfcTech::NfcA);
        assert_eq!(known.session_id, session.id);

        let anonymous = TagReadResult::from_metadata(&session, TagMetadata::anonymous());
        assert_eq!(anonymous.display_id(crate::UNKNOWN_TAG_LABEL), "Unknown");
    }

    #[test]
    fn test_capability_flags() {
        assert!(!RadioCapability::Unprobed.is_probed());
        assert!(RadioCapability::Ready.is_ready());
        assert!(RadioCapability::Unsupported.is_probed());
        let degraded = RadioCapability::Degraded {
            reason: "start failed".into(),
        };
        assert!(!degraded.is_ready());
        assert_eq!(degraded.to_string(), "degraded (start failed)");
    }
}
