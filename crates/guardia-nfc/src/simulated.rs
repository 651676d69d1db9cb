//! # Simulated Radio
//!
//! An in-process [`NfcRadio`] for the console front end and for tests.
//!
//! Probe and start outcomes, refused technologies and release failures are
//! scripted through [`SimulatedRadioConfig`]. Tags are put in the field with
//! [`SimulatedRadio::present_tag`] (only while a technology is held, like a
//! real card tapped against an idle phone) or queued ahead of time with
//! [`SimulatedRadio::queue_tag`]. A tap that was not read before its handle
//! was released is never delivered to a later handle. Counters in
//! [`RadioStats`] record every handle the controller takes and gives back.

use std::sync::Mutex;

use async_trait::async_trait;
use guardia_core::{NfcTech, TagId, TagMetadata};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{RadioError, RadioResult};
use crate::radio::NfcRadio;

// =============================================================================
// Configuration
// =============================================================================

/// Scripted behavior of a [`SimulatedRadio`].
#[derive(Debug, Clone)]
pub struct SimulatedRadioConfig {
    /// Whether the probe reports NFC hardware.
    pub supported: bool,
    /// If set, the probe itself fails with this message.
    pub probe_error: Option<String>,
    /// If set, starting the subsystem fails with this message.
    pub start_error: Option<String>,
    /// Technologies the host refuses to hand out.
    pub failing_techs: Vec<NfcTech>,
    /// If set, every release reports this error (the handle is still freed).
    pub release_error: Option<String>,
}

impl Default for SimulatedRadioConfig {
    fn default() -> Self {
        SimulatedRadioConfig {
            supported: true,
            probe_error: None,
            start_error: None,
            failing_techs: Vec::new(),
            release_error: None,
        }
    }
}

impl SimulatedRadioConfig {
    /// A device without NFC hardware.
    pub fn unsupported() -> Self {
        SimulatedRadioConfig {
            supported: false,
            ..Default::default()
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Counters kept by a [`SimulatedRadio`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioStats {
    pub probes: u32,
    pub starts: u32,
    /// Calls to `acquire_technology`, successful or not.
    pub acquire_attempts: u32,
    pub acquisitions: u32,
    pub releases: u32,
    /// Handles currently held (0 or 1).
    pub outstanding_handles: u32,
    pub peak_outstanding_handles: u32,
    /// Acquisitions refused because a handle was already held.
    pub busy_rejections: u32,
    /// Releases with nothing held.
    pub spurious_releases: u32,
}

// =============================================================================
// Simulated Radio
// =============================================================================

#[derive(Debug)]
enum Outcome {
    Tag(TagMetadata),
    Fail(String),
}

#[derive(Debug)]
struct Presentation {
    /// Handle generation the tap belongs to; `None` for scripted reads.
    generation: Option<u64>,
    outcome: Outcome,
}

#[derive(Debug)]
struct SimState {
    config: SimulatedRadioConfig,
    held: Option<NfcTech>,
    /// Bumped on every release so taps made under an old handle are ignored.
    generation: u64,
    stats: RadioStats,
}

/// In-process NFC radio.
pub struct SimulatedRadio {
    state: Mutex<SimState>,
    field_tx: mpsc::UnboundedSender<Presentation>,
    field_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Presentation>>,
}

impl SimulatedRadio {
    pub fn new(config: SimulatedRadioConfig) -> Self {
        let (field_tx, field_rx) = mpsc::unbounded_channel();
        SimulatedRadio {
            state: Mutex::new(SimState {
                config,
                held: None,
                generation: 0,
                stats: RadioStats::default(),
            }),
            field_tx,
            field_rx: tokio::sync::Mutex::new(field_rx),
        }
    }

    /// Changes the scripted behavior, e.g. to plug in hardware before a
    /// reinitialization.
    pub fn update_config(&self, update: impl FnOnce(&mut SimulatedRadioConfig)) {
        update(&mut self.lock().config);
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> RadioStats {
        self.lock().stats
    }

    /// Technology currently held, if any.
    pub fn held_technology(&self) -> Option<NfcTech> {
        self.lock().held
    }

    /// Taps a tag against the radio.
    ///
    /// Returns false (and the tap is lost) if no technology is held.
    pub fn present_tag(&self, id: TagId) -> bool {
        self.present(Outcome::Tag(TagMetadata::with_id(id)))
    }

    /// Taps a tag that reports no identifier.
    pub fn present_anonymous_tag(&self) -> bool {
        self.present(Outcome::Tag(TagMetadata::anonymous()))
    }

    /// Queues a tag for the next read, whether or not a technology is held.
    pub fn queue_tag(&self, metadata: TagMetadata) {
        self.script(Outcome::Tag(metadata));
    }

    /// Makes the next read fail with `reason`.
    pub fn fail_next_read(&self, reason: impl Into<String>) {
        self.script(Outcome::Fail(reason.into()));
    }

    fn present(&self, outcome: Outcome) -> bool {
        let generation = {
            let state = self.lock();
            if state.held.is_none() {
                debug!("Tag presented while no technology is held, ignoring");
                return false;
            }
            state.generation
        };
        self.field_tx
            .send(Presentation {
                generation: Some(generation),
                outcome,
            })
            .is_ok()
    }

    fn script(&self, outcome: Outcome) {
        let _ = self.field_tx.send(Presentation {
            generation: None,
            outcome,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SimulatedRadio {
    fn default() -> Self {
        Self::new(SimulatedRadioConfig::default())
    }
}

#[async_trait]
impl NfcRadio for SimulatedRadio {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn probe_support(&self) -> RadioResult<bool> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.stats.probes += 1;
        match &state.config.probe_error {
            Some(reason) => Err(RadioError::ProbeFailed(reason.clone())),
            None => Ok(state.config.supported),
        }
    }

    async fn start_subsystem(&self) -> RadioResult<()> {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.stats.starts += 1;
        match &state.config.start_error {
            Some(reason) => Err(RadioError::SubsystemStart(reason.clone())),
            None => Ok(()),
        }
    }

    fn acquire_technology(&self, tech: NfcTech) -> RadioResult<()> {
        let mut state = self.lock();
        state.stats.acquire_attempts += 1;

        if state.held.is_some() {
            state.stats.busy_rejections += 1;
            return Err(RadioError::Busy);
        }
        if state.config.failing_techs.contains(&tech) {
            return Err(RadioError::Acquisition {
                tech,
                reason: "technology not available".to_string(),
            });
        }

        state.held = Some(tech);
        state.stats.acquisitions += 1;
        state.stats.outstanding_handles += 1;
        state.stats.peak_outstanding_handles = state
            .stats
            .peak_outstanding_handles
            .max(state.stats.outstanding_handles);
        Ok(())
    }

    async fn read_tag(&self) -> RadioResult<TagMetadata> {
        let held = self.lock().held.is_some();
        if !held {
            return Err(RadioError::Read("no technology acquired".to_string()));
        }

        let mut field = self.field_rx.lock().await;
        loop {
            let Some(presentation) = field.recv().await else {
                return Err(RadioError::Unavailable);
            };

            let current = self.lock().generation;
            if presentation.generation.is_some_and(|g| g != current) {
                trace!(?presentation, "Discarding tap from an earlier handle");
                continue;
            }

            return match presentation.outcome {
                Outcome::Tag(metadata) => Ok(metadata),
                Outcome::Fail(reason) => Err(RadioError::Read(reason)),
            };
        }
    }

    fn release_technology(&self) -> RadioResult<()> {
        let release_error = {
            let mut state = self.lock();
            if state.held.take().is_none() {
                state.stats.spurious_releases += 1;
                return Ok(());
            }
            state.generation += 1;
            state.stats.releases += 1;
            state.stats.outstanding_handles -= 1;
            state.config.release_error.clone()
        };

        match release_error {
            Some(reason) => Err(RadioError::Release(reason)),
            None => Ok(()),
        }
    }
}
