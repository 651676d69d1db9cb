//! # Console Display
//!
//! Renders [`ScanView`] frames as text and prints controller events.
//!
//! ```text
//! ── IES San Juan de la Rambla · Puerta principal ─ [result]
//!   Card detected
//!   Tap next to scan another card.
//!
//!   ┃ Card detected
//!   ┃ ID: 04A22B
//!   ┃ nfc_a · Serial number captured
//!
//!   > next
//! ```

use std::fmt::Write as _;

use guardia_core::{PrimaryAction, ScanState, ScanView};
use guardia_nfc::{Notice, ScanEventEmitter};
use tracing::debug;

/// Total width of the header rule.
const RULE_WIDTH: usize = 60;

/// Renders one frame of the scan screen.
pub fn render_view(header: &str, view: &ScanView) -> String {
    let mut out = String::new();

    let mode = format!("[{}]", view.mode);
    let rule = RULE_WIDTH.saturating_sub(header.chars().count() + mode.len() + 5);
    let _ = writeln!(out, "── {} {} {}", header, "─".repeat(rule.max(3)), mode);
    let _ = writeln!(out, "  {}", view.title);
    let _ = writeln!(out, "  {}", view.subtitle);

    if let Some(card) = &view.card {
        let _ = writeln!(out);
        let _ = writeln!(out, "  ┃ {}", card.heading);
        let _ = writeln!(out, "  ┃ {}", card.detail);
        let _ = writeln!(out, "  ┃ {} · {}", card.tech, card.status);
    }

    if let Some(action) = action_hint(view.primary_action) {
        let _ = writeln!(out);
        let _ = writeln!(out, "  > {}", action);
    }

    out
}

/// Renders a notice box.
pub fn render_notice(notice: &Notice) -> String {
    format!("!! {}: {}", notice.title(), notice.message())
}

fn action_hint(action: PrimaryAction) -> Option<&'static str> {
    match action {
        PrimaryAction::Read => Some("scan"),
        PrimaryAction::Cancel => Some("cancel (or tap <hex-id>)"),
        PrimaryAction::Next => Some("next"),
        PrimaryAction::None => None,
    }
}

// =============================================================================
// Console Emitter
// =============================================================================

/// Prints every state change and notice to stdout. Diagnostics only go to
/// the log.
pub struct ConsoleEmitter {
    header: String,
    unknown_label: String,
}

impl ConsoleEmitter {
    pub fn new(header: impl Into<String>, unknown_label: impl Into<String>) -> Self {
        ConsoleEmitter {
            header: header.into(),
            unknown_label: unknown_label.into(),
        }
    }
}

impl ScanEventEmitter for ConsoleEmitter {
    fn emit_state(&self, state: &ScanState) {
        let view = ScanView::project(state, &self.unknown_label);
        println!("{}", render_view(&self.header, &view));
    }

    fn emit_notice(&self, notice: &Notice) {
        println!("{}", render_notice(notice));
    }

    fn emit_diagnostic(&self, message: &str) {
        debug!(diagnostic = message, "Scanner diagnostic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardia_core::{NfcTech, ScanSession, TagId, TagMetadata, TagReadResult};

    #[test]
    fn test_idle_frame() {
        let view = ScanView::project(&ScanState::Idle, "Unknown");
        let frame = render_view("IES San Juan · Gate", &view);

        assert!(frame.starts_with("── IES San Juan · Gate ─"));
        assert!(frame.lines().next().unwrap().ends_with("[idle]"));
        assert!(frame.contains("NFC read mode"));
        assert!(frame.contains("> scan"));
        assert!(!frame.contains('┃'));
    }

    #[test]
    fn test_result_frame_shows_card() {
        let session = ScanSession::new(NfcTech::NfcA);
        let result = TagReadResult::from_metadata(
            &session,
            TagMetadata::with_id(TagId::parse("04:a2:2b").unwrap()),
        );
        let view = ScanView::project(&ScanState::Result(result), "Unknown");
        let frame = render_view("Gate", &view);

        assert!(frame.contains("┃ ID: 04A22B"));
        assert!(frame.contains("┃ nfc_a · Serial number captured"));
        assert!(frame.contains("> next"));
    }

    #[test]
    fn test_unsupported_frame_has_no_action() {
        let view = ScanView::project(&ScanState::Unsupported, "Unknown");
        let frame = render_view("Gate", &view);
        assert!(frame.contains("[unsupported]"));
        assert!(!frame.contains("> "));
    }

    #[test]
    fn test_notice_text() {
        let notice = Notice::InitializationFailure {
            reason: "firmware".into(),
        };
        assert_eq!(
            render_notice(&notice),
            "!! NFC unavailable: NFC could not be started: firmware"
        );
    }
}
