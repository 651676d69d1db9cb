//! # Screen Projection
//!
//! Turns a [`ScanState`] into what a scan screen shows. Front ends render a
//! [`ScanView`] as-is instead of keeping their own `scanning` / `result`
//! flags, so they cannot disagree with the controller.
//!
//! ```text
//! ┌──────────────┬──────────────────────┬────────────────┐
//! │ state        │ title                │ primary action │
//! ├──────────────┼──────────────────────┼────────────────┤
//! │ idle         │ NFC read mode        │ read           │
//! │ scanning     │ Reading chip...      │ cancel         │
//! │ result       │ Card detected        │ next           │
//! │ unsupported  │ NFC unavailable      │ none           │
//! └──────────────┴──────────────────────┴────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::state::{ScanState, ScanStateKind};
use crate::types::{NfcTech, TagReadResult};

/// The single button a scan screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Start a scan.
    Read,
    /// Abort the scan in progress.
    Cancel,
    /// Dismiss the result and go back to idle.
    Next,
    /// Nothing to do (no NFC hardware).
    None,
}

/// Card shown after a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TagCard {
    pub heading: String,
    pub detail: String,
    pub tag_id: Option<String>,
    pub tech: NfcTech,
    /// Display placeholder. Always true; no authorization lookup exists.
    pub authorized: bool,
    pub status: String,
}

impl TagCard {
    pub fn from_result(result: &TagReadResult, unknown_label: &str) -> Self {
        TagCard {
            heading: "Card detected".to_string(),
            detail: format!("ID: {}", result.display_id(unknown_label)),
            tag_id: result.tag_id().map(str::to_string),
            tech: result.tech,
            authorized: true,
            status: "Serial number captured".to_string(),
        }
    }
}

/// Everything a scan screen needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanView {
    pub mode: ScanStateKind,
    pub title: String,
    pub subtitle: String,
    pub primary_action: PrimaryAction,
    pub card: Option<TagCard>,
}

impl ScanView {
    /// Projects `state` onto a screen. `unknown_label` replaces a missing tag id.
    pub fn project(state: &ScanState, unknown_label: &str) -> Self {
        let (title, subtitle, primary_action, card) = match state {
            ScanState::Idle => (
                "NFC read mode",
                "Tap to read the serial number of an NFC card.",
                PrimaryAction::Read,
                None,
            ),
            ScanState::Scanning(_) => (
                "Reading chip...",
                "Hold the device near the card...",
                PrimaryAction::Cancel,
                None,
            ),
            ScanState::Result(result) => (
                "Card detected",
                "Tap next to scan another card.",
                PrimaryAction::Next,
                Some(TagCard::from_result(result, unknown_label)),
            ),
            ScanState::Unsupported => (
                "NFC unavailable",
                "This device does not support NFC.",
                PrimaryAction::None,
                None,
            ),
        };

        ScanView {
            mode: state.kind(),
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            primary_action,
            card,
        }
    }
}
