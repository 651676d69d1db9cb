//! # Radio Abstraction
//!
//! The host NFC subsystem as seen by the controller, and the lease that
//! guarantees an acquired technology is given back.
//!
//! ## Handle Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Technology Handle Lifecycle                         │
//! │                                                                         │
//! │   acquire_with_fallback(Ndef, Some(NfcA))                              │
//! │        │                                                                │
//! │        ├── acquire(Ndef) ── ok ─────────────┐                          │
//! │        │                                    │                          │
//! │        └── refused ── acquire(NfcA) ── ok ──┤                          │
//! │                           │                 ▼                          │
//! │                        refused      ┌────────────────┐                 │
//! │                           │         │TechnologyLease │                 │
//! │                           ▼         └───────┬────────┘                 │
//! │              ScanFailure::Acquisition       │                          │
//! │              Failed (nothing held)          │ release() or Drop        │
//! │                                             ▼                          │
//! │                                  release_technology()  (exactly once)  │
//! │                                  errors logged, never propagated       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Acquisition and release are synchronous so the controller can perform
//! them while holding its state lock. Only waiting for hardware is async.

use std::sync::Arc;

use async_trait::async_trait;
use guardia_core::{NfcTech, TagMetadata};
use tracing::{debug, warn};

use crate::error::{RadioResult, ScanFailure};

// =============================================================================
// NfcRadio Trait
// =============================================================================

/// Host NFC subsystem.
///
/// At most one technology may be held at a time. Implementations are free to
/// reject a second `acquire_technology` with [`RadioError::Busy`](crate::RadioError::Busy).
#[async_trait]
pub trait NfcRadio: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Asks whether NFC hardware exists.
    async fn probe_support(&self) -> RadioResult<bool>;

    /// Starts the NFC subsystem. Called once after a successful probe.
    async fn start_subsystem(&self) -> RadioResult<()>;

    /// Requests exclusive use of `tech`.
    fn acquire_technology(&self, tech: NfcTech) -> RadioResult<()>;

    /// Waits for a tag to enter the field and reads its metadata.
    ///
    /// Must be cancel-safe: dropping the future abandons the wait.
    async fn read_tag(&self) -> RadioResult<TagMetadata>;

    /// Gives back the technology acquired last. Best-effort.
    fn release_technology(&self) -> RadioResult<()>;
}

// =============================================================================
// Technology Lease
// =============================================================================

/// An acquired technology. Released exactly once, on [`release`](Self::release)
/// or when dropped.
pub struct TechnologyLease {
    radio: Arc<dyn NfcRadio>,
    tech: NfcTech,
    released: bool,
}

impl TechnologyLease {
    /// Acquires `tech` on `radio`.
    pub fn acquire(radio: Arc<dyn NfcRadio>, tech: NfcTech) -> RadioResult<Self> {
        radio.acquire_technology(tech)?;
        debug!(radio = radio.name(), tech = %tech, "Technology acquired");
        Ok(TechnologyLease {
            radio,
            tech,
            released: false,
        })
    }

    /// Acquires `primary`, or `fallback` if the primary is refused.
    ///
    /// At most one fallback attempt is made. Nothing is held on error.
    pub fn acquire_with_fallback(
        radio: Arc<dyn NfcRadio>,
        primary: NfcTech,
        fallback: Option<NfcTech>,
    ) -> Result<Self, ScanFailure> {
        let primary_err = match Self::acquire(radio.clone(), primary) {
            Ok(lease) => return Ok(lease),
            Err(err) => err,
        };

        let Some(fallback) = fallback else {
            warn!(tech = %primary, error = %primary_err, "Technology refused, no fallback configured");
            return Err(ScanFailure::AcquisitionFailed {
                primary: primary_err.to_string(),
                fallback: None,
            });
        };

        debug!(
            primary = %primary,
            fallback = %fallback,
            error = %primary_err,
            "Primary technology refused, trying fallback"
        );

        Self::acquire(radio, fallback).map_err(|fallback_err| {
            warn!(
                primary = %primary_err,
                fallback = %fallback_err,
                "No technology could be acquired"
            );
            ScanFailure::AcquisitionFailed {
                primary: primary_err.to_string(),
                fallback: Some(fallback_err.to_string()),
            }
        })
    }

    /// Technology held by this lease.
    pub fn tech(&self) -> NfcTech {
        self.tech
    }

    /// Releases the technology now.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match self.radio.release_technology() {
            Ok(()) => debug!(tech = %self.tech, "Technology released"),
            Err(err) => warn!(tech = %self.tech, error = %err, "Technology release failed"),
        }
    }
}

impl Drop for TechnologyLease {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for TechnologyLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechnologyLease")
            .field("radio", &self.radio.name())
            .field("tech", &self.tech)
            .field("released", &self.released)
            .finish()
    }
}
