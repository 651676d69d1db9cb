//! # Validation Module
//!
//! Input validation for values that reach the scanner from outside: tag
//! identifiers reported by a radio backend, and identifiers typed by an
//! operator or written in a config file.
//!
//! ## Usage
//! ```rust
//! use guardia_core::validation::normalize_tag_id;
//!
//! assert_eq!(normalize_tag_id("04:aa:bb:cc").unwrap(), "04AABBCC");
//! assert!(normalize_tag_id("").is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_TAG_ID_BYTES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Tag Identifier
// =============================================================================

/// Normalizes a textual tag identifier.
///
/// ## Rules
/// - Separators (`:`, `-`, whitespace) are stripped
/// - Must not be empty after stripping
/// - Hex digits only, even number of them
/// - At most [`MAX_TAG_ID_BYTES`] bytes
///
/// The result is uppercase.
pub fn normalize_tag_id(raw: &str) -> ValidationResult<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == ':' || *c == '-'))
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "tag_id".to_string(),
        });
    }

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidFormat {
            field: "tag_id".to_string(),
            reason: format!("'{}' is not a hex digit", bad),
        });
    }

    if digits.len() % 2 != 0 {
        return Err(ValidationError::InvalidFormat {
            field: "tag_id".to_string(),
            reason: "must contain whole bytes (even number of hex digits)".to_string(),
        });
    }

    if digits.len() / 2 > MAX_TAG_ID_BYTES {
        return Err(ValidationError::TooLong {
            field: "tag_id".to_string(),
            max: MAX_TAG_ID_BYTES,
        });
    }

    Ok(digits.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a scan timeout in seconds (0 disables the timeout).
pub fn validate_scan_timeout_secs(secs: u64) -> ValidationResult<()> {
    const MAX_SCAN_TIMEOUT_SECS: u64 = 600;

    if secs > MAX_SCAN_TIMEOUT_SECS {
        return Err(ValidationError::OutOfRange {
            field: "scan_timeout_secs".to_string(),
            min: 0,
            max: MAX_SCAN_TIMEOUT_SECS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
