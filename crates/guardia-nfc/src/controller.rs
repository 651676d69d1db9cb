//! # Scan Session Controller
//!
//! Owns the NFC radio on behalf of the scan screen: probes it once, runs one
//! scan at a time, and always gives the acquired technology back.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          start_scan()                                   │
//! │                                                                         │
//! │  ┌─────────────── begin (state lock held, no await) ─────────────────┐ │
//! │  │ check disposed / state / capability                               │ │
//! │  │ acquire primary, else fallback ──► TechnologyLease                │ │
//! │  │ Idle ──Started──► Scanning(session)      cancel channel armed     │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                               │                                         │
//! │  ┌─────────────── wait (only suspension point) ──────────────────────┐ │
//! │  │ select! biased:  cancel signal │ radio.read_tag() │ timeout       │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                               │                                         │
//! │  ┌─────────────── finish (state lock held) ──────────────────────────┐ │
//! │  │ session no longer active? ──► Cancelled, late read discarded      │ │
//! │  │ release lease                                                     │ │
//! │  │ Scanning ──TagRead / Failed / Cancelled──► Result / Idle          │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                                                                         │
//! │  cancel() / teardown() / dropped future: release + Idle immediately,   │
//! │  under the same lock, and signal the waiting scan.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Scanning" and "technology held" only ever change together, under one
//! lock, so no observer can see one without the other.
//!
//! Emitter events are queued under that lock and delivered after it is
//! dropped, one thread at a time, in the order the states were applied.

use std::collections::VecDeque;
use std::future::pending;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use guardia_core::{
    NfcTech, RadioCapability, ScanEvent, ScanSession, ScanState, TagMetadata, TagReadResult,
};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::error::{CancelReason, InitError, RadioResult, ScanError, ScanFailure, ScanResult};
use crate::events::{NoOpEmitter, Notice, ScanEventEmitter};
use crate::radio::{NfcRadio, TechnologyLease};

// =============================================================================
// Scan Settings
// =============================================================================

/// Technology and timeout policy for scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub primary: NfcTech,
    /// Tried once if the primary is refused.
    pub fallback: Option<NfcTech>,
    /// `None` waits for a tag indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        ScanSettings {
            primary: config.primary_tech,
            fallback: config.fallback(),
            timeout: config.timeout(),
        }
    }
}

// =============================================================================
// Controller State
// =============================================================================

struct Inner {
    state: ScanState,
    capability: RadioCapability,
    /// Cached result of the last probe; `None` until probed.
    init_outcome: Option<Result<(), InitError>>,
    /// Held exactly while `state` is `Scanning`.
    lease: Option<TechnologyLease>,
    cancel_tx: Option<oneshot::Sender<CancelReason>>,
    /// Why the last session was ended from outside the scan itself.
    last_cancel: Option<(Uuid, CancelReason)>,
    disposed: bool,
    /// Events waiting for the emitter, oldest first.
    outbox: VecDeque<Emission>,
    /// Set while some thread is draining `outbox`.
    dispatching: bool,
}

enum Emission {
    State(ScanState),
    Notice(Notice),
    Diagnostic(String),
}

enum WaitOutcome {
    Read(RadioResult<TagMetadata>),
    Cancelled(CancelReason),
}

// =============================================================================
// Scan Session Controller
// =============================================================================

/// Lifecycle of NFC read attempts.
///
/// ## Usage
/// ```rust,no_run
/// use std::sync::Arc;
/// use guardia_nfc::{ScanSessionController, ScanSettings, SimulatedRadio};
///
/// # async fn run() {
/// let controller = ScanSessionController::new(
///     Arc::new(SimulatedRadio::default()),
///     ScanSettings::default(),
/// );
/// controller.initialize().await.ok();
/// match controller.start_scan().await {
///     Ok(result) => println!("read {:?}", result.tag_id()),
///     Err(err) => println!("{}", err),
/// }
/// controller.teardown();
/// # }
/// ```
pub struct ScanSessionController {
    radio: Arc<dyn NfcRadio>,
    settings: ScanSettings,
    emitter: Arc<dyn ScanEventEmitter>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<ScanState>,
    /// Serializes probes so concurrent `initialize` calls share one outcome.
    init_lock: tokio::sync::Mutex<()>,
}

impl ScanSessionController {
    /// Creates a controller with no event emitter.
    pub fn new(radio: Arc<dyn NfcRadio>, settings: ScanSettings) -> Self {
        Self::with_emitter(radio, settings, Arc::new(NoOpEmitter))
    }

    /// Creates a controller with a custom event emitter.
    pub fn with_emitter(
        radio: Arc<dyn NfcRadio>,
        settings: ScanSettings,
        emitter: Arc<dyn ScanEventEmitter>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ScanState::Idle);
        ScanSessionController {
            radio,
            settings,
            emitter,
            inner: Mutex::new(Inner {
                state: ScanState::Idle,
                capability: RadioCapability::Unprobed,
                init_outcome: None,
                lease: None,
                cancel_tx: None,
                last_cancel: None,
                disposed: false,
                outbox: VecDeque::new(),
                dispatching: false,
            }),
            state_tx,
            init_lock: tokio::sync::Mutex::new(()),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.lock().state.clone()
    }

    /// Current radio capability.
    pub fn capability(&self) -> RadioCapability {
        self.lock().capability.clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Probes the radio and starts its subsystem.
    ///
    /// Idempotent: later calls return the first outcome without touching the
    /// hardware. A failure is announced once through the emitter.
    #[instrument(skip(self), fields(radio = self.radio.name()))]
    pub async fn initialize(&self) -> Result<(), InitError> {
        let _probing = self.init_lock.lock().await;
        {
            let inner = self.lock();
            if inner.disposed {
                return Err(InitError::Disposed);
            }
            if let Some(outcome) = &inner.init_outcome {
                debug!("Already initialized");
                return outcome.clone();
            }
        }
        self.probe().await
    }

    /// Forgets the cached probe and probes again.
    ///
    /// The only way out of `Unsupported`. Rejected while scanning.
    #[instrument(skip(self), fields(radio = self.radio.name()))]
    pub async fn reinitialize(&self) -> Result<(), InitError> {
        let _probing = self.init_lock.lock().await;
        {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(InitError::Disposed);
            }
            if inner.state.is_scanning() {
                return Err(InitError::Busy);
            }
            inner.init_outcome = None;
            inner.capability = RadioCapability::Unprobed;
        }
        info!("Reinitializing NFC radio");
        self.probe().await
    }

    async fn probe(&self) -> Result<(), InitError> {
        let (capability, outcome) = match self.radio.probe_support().await {
            Ok(true) => match self.radio.start_subsystem().await {
                Ok(()) => (RadioCapability::Ready, Ok(())),
                Err(err) => {
                    error!(error = %err, "NFC subsystem failed to start");
                    (
                        RadioCapability::Degraded {
                            reason: err.to_string(),
                        },
                        Err(InitError::InitializationFailure(err.to_string())),
                    )
                }
            },
            Ok(false) => {
                warn!("NFC hardware not present");
                (RadioCapability::Unsupported, Err(InitError::UnsupportedHardware))
            }
            Err(err) => {
                warn!(error = %err, "NFC probe failed, treating hardware as unsupported");
                (RadioCapability::Unsupported, Err(InitError::UnsupportedHardware))
            }
        };

        {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(InitError::Disposed);
            }
            inner.capability = capability.clone();
            inner.init_outcome = Some(outcome.clone());

            let event = if capability == RadioCapability::Unsupported {
                ScanEvent::ProbeUnsupported
            } else {
                ScanEvent::ProbeSucceeded
            };
            self.transition(&mut inner, event);
            if let Some(notice) = outcome.as_ref().err().and_then(Notice::from_init_error) {
                inner.outbox.push_back(Emission::Notice(notice));
            }
        }

        info!(capability = %capability, "NFC radio probed");
        self.dispatch();
        outcome
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    /// Reads one tag.
    ///
    /// Valid only from `Idle`. Acquires the primary technology, or the
    /// fallback if the primary is refused, then waits for a tag. Whatever
    /// happens (tag, error, cancel, timeout, teardown, or this future being
    /// dropped) the technology is released exactly once.
    ///
    /// ## Errors
    /// - `Busy` if a scan is already running (nothing is acquired)
    /// - `InvalidState` from `Result`; call [`reset`](Self::reset) first
    /// - `Failed` for missing/degraded hardware, refused technologies and read errors
    /// - `Cancelled` for cancel, timeout, teardown
    pub async fn start_scan(&self) -> ScanResult<TagReadResult> {
        let (session, cancel_rx) = self.begin_session()?;

        let mut guard = SessionGuard {
            controller: self,
            session_id: session.id,
            armed: true,
        };
        let outcome = self.wait_for_tag(cancel_rx).await;
        guard.armed = false;

        self.finish_session(&session, outcome)
    }

    fn begin_session(&self) -> ScanResult<(ScanSession, oneshot::Receiver<CancelReason>)> {
        let (session, cancel_rx) = {
            let mut inner = self.lock();

            if inner.disposed {
                return Err(ScanFailure::Disposed.into());
            }
            match &inner.state {
                ScanState::Idle => {}
                ScanState::Scanning(active) => {
                    debug!(session = %active.id, "Scan already in progress");
                    return Err(ScanError::Busy);
                }
                ScanState::Result(_) => return Err(ScanError::InvalidState(inner.state.kind())),
                ScanState::Unsupported => {
                    return Err(ScanFailure::UnsupportedHardware.into())
                }
            }
            match &inner.capability {
                RadioCapability::Ready => {}
                RadioCapability::Unprobed => return Err(ScanFailure::NotInitialized.into()),
                RadioCapability::Unsupported => {
                    return Err(ScanFailure::UnsupportedHardware.into())
                }
                RadioCapability::Degraded { reason } => {
                    return Err(ScanFailure::Degraded(reason.clone()).into())
                }
            }

            let lease = TechnologyLease::acquire_with_fallback(
                self.radio.clone(),
                self.settings.primary,
                self.settings.fallback,
            )?;
            let session = ScanSession::new(lease.tech());

            if !self.transition(&mut inner, ScanEvent::Started(session.clone())) {
                lease.release();
                return Err(ScanError::InvalidState(inner.state.kind()));
            }

            let (cancel_tx, cancel_rx) = oneshot::channel();
            inner.lease = Some(lease);
            inner.cancel_tx = Some(cancel_tx);
            (session, cancel_rx)
        };

        info!(session = %session.id, tech = %session.tech, "Scan started");
        self.dispatch();
        Ok((session, cancel_rx))
    }

    async fn wait_for_tag(&self, mut cancel_rx: oneshot::Receiver<CancelReason>) -> WaitOutcome {
        let timeout = self.settings.timeout;

        tokio::select! {
            biased;

            reason = &mut cancel_rx => {
                WaitOutcome::Cancelled(reason.unwrap_or(CancelReason::Teardown))
            }
            read = self.radio.read_tag() => WaitOutcome::Read(read),
            _ = timeout_elapsed(timeout) => WaitOutcome::Cancelled(CancelReason::Timeout),
        }
    }

    fn finish_session(
        &self,
        session: &ScanSession,
        outcome: WaitOutcome,
    ) -> ScanResult<TagReadResult> {
        let result = {
            let mut inner = self.lock();

            let still_active = inner.state.session().map(|s| s.id) == Some(session.id);
            if !still_active {
                // Someone else already released and moved on.
                let reason = match inner.last_cancel {
                    Some((id, reason)) if id == session.id => reason,
                    _ => CancelReason::User,
                };
                if let WaitOutcome::Read(Ok(_)) = outcome {
                    debug!(session = %session.id, "Discarding tag read for ended session");
                }
                return Err(ScanError::Cancelled(reason));
            }

            if let Some(lease) = inner.lease.take() {
                lease.release();
            }
            inner.cancel_tx = None;

            let (event, result) = match outcome {
                WaitOutcome::Read(Ok(metadata)) => {
                    let read = TagReadResult::from_metadata(session, metadata);
                    info!(
                        session = %session.id,
                        tag = read.tag_id().unwrap_or("-"),
                        tech = %read.tech,
                        "Tag read"
                    );
                    (ScanEvent::TagRead(read.clone()), Ok(read))
                }
                WaitOutcome::Read(Err(err)) => {
                    warn!(session = %session.id, error = %err, "Tag read failed");
                    (
                        ScanEvent::Failed {
                            session_id: session.id,
                        },
                        Err(ScanFailure::ReadFailed(err.to_string()).into()),
                    )
                }
                WaitOutcome::Cancelled(reason) => {
                    info!(session = %session.id, %reason, "Scan cancelled");
                    (
                        ScanEvent::Cancelled {
                            session_id: session.id,
                        },
                        Err(ScanError::Cancelled(reason)),
                    )
                }
            };

            self.transition(&mut inner, event);
            if let Err(err) = &result {
                if !err.is_cancellation() {
                    inner.outbox.push_back(Emission::Diagnostic(err.to_string()));
                }
            }
            result
        };

        self.dispatch();
        result
    }

    // =========================================================================
    // Cancel / Reset / Teardown
    // =========================================================================

    /// Cancels the scan in progress. No-op (returns false) otherwise.
    ///
    /// The technology is released and the state is `Idle` when this returns;
    /// the waiting `start_scan` returns `Cancelled(User)`.
    pub fn cancel(&self) -> bool {
        self.end_session(None, CancelReason::User)
    }

    /// Dismisses the displayed result. No-op (returns false) outside `Result`.
    pub fn reset(&self) -> bool {
        let reset = {
            let mut inner = self.lock();
            if inner.state.result().is_none() {
                return false;
            }
            self.transition(&mut inner, ScanEvent::Reset)
        };

        self.dispatch();
        reset
    }

    /// Releases anything held and disposes the controller.
    ///
    /// Release errors are logged and swallowed. Idempotent. After teardown
    /// every `start_scan` fails with `Failed(Disposed)`.
    pub fn teardown(&self) {
        {
            let mut inner = self.lock();
            if inner.disposed {
                return;
            }
            inner.disposed = true;

            if let Some(session_id) = inner.state.session().map(|s| s.id) {
                inner.last_cancel = Some((session_id, CancelReason::Teardown));
            }
            if let Some(lease) = inner.lease.take() {
                lease.release();
            }
            if let Some(cancel_tx) = inner.cancel_tx.take() {
                let _ = cancel_tx.send(CancelReason::Teardown);
            }
            self.transition(&mut inner, ScanEvent::TornDown);
        }

        info!("Scanner torn down");
        self.dispatch();
    }

    /// Ends the active session from outside `start_scan`.
    ///
    /// With `expected` set, only that session is ended.
    fn end_session(&self, expected: Option<Uuid>, reason: CancelReason) -> bool {
        let ended = {
            let mut inner = self.lock();
            let Some(session_id) = inner.state.session().map(|s| s.id) else {
                return false;
            };
            if expected.is_some_and(|id| id != session_id) {
                return false;
            }

            if let Some(lease) = inner.lease.take() {
                lease.release();
            }
            if let Some(cancel_tx) = inner.cancel_tx.take() {
                let _ = cancel_tx.send(reason);
            }
            inner.last_cancel = Some((session_id, reason));
            info!(session = %session_id, %reason, "Scan cancelled");
            self.transition(&mut inner, ScanEvent::Cancelled { session_id })
        };

        self.dispatch();
        ended
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Applies `event`, publishes the new state and queues it for the
    /// emitter. Returns false if the transition table rejects the event.
    fn transition(&self, inner: &mut Inner, event: ScanEvent) -> bool {
        let name = event.name();
        match inner.state.apply(event) {
            Ok(next) => {
                debug!(from = %inner.state.kind(), to = %next.kind(), event = name, "Scan state transition");
                inner.state = next.clone();
                self.state_tx.send_replace(next.clone());
                inner.outbox.push_back(Emission::State(next));
                true
            }
            Err(err) => {
                error!(error = %err, "Rejected scan state transition");
                false
            }
        }
    }

    /// Delivers queued events to the emitter, oldest first.
    ///
    /// Must be called without the state lock. If another thread is already
    /// delivering, it picks up whatever this thread queued.
    fn dispatch(&self) {
        {
            let mut inner = self.lock();
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let next = {
                let mut inner = self.lock();
                let next = inner.outbox.pop_front();
                if next.is_none() {
                    inner.dispatching = false;
                }
                next
            };

            match next {
                Some(Emission::State(state)) => self.emitter.emit_state(&state),
                Some(Emission::Notice(notice)) => self.emitter.emit_notice(&notice),
                Some(Emission::Diagnostic(message)) => self.emitter.emit_diagnostic(&message),
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ScanSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn timeout_elapsed(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => pending::<()>().await,
    }
}

/// Ends the session if the `start_scan` future is dropped mid-wait.
struct SessionGuard<'a> {
    controller: &'a ScanSessionController,
    session_id: Uuid,
    armed: bool,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(session = %self.session_id, "Scan abandoned by caller");
            self.controller
                .end_session(Some(self.session_id), CancelReason::Dropped);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{SimulatedRadio, SimulatedRadioConfig};
    use guardia_core::{ScanStateKind, TagId};

    fn controller(config: SimulatedRadioConfig) -> (Arc<SimulatedRadio>, ScanSessionController) {
        let radio = Arc::new(SimulatedRadio::new(config));
        let controller = ScanSessionController::new(radio.clone(), ScanSettings::default());
        (radio, controller)
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        controller.initialize().await.unwrap();

        assert_eq!(controller.capability(), RadioCapability::Ready);
        let stats = radio.stats();
        assert_eq!(stats.probes, 1);
        assert_eq!(stats.starts, 1);
    }

    #[tokio::test]
    async fn test_scan_before_initialize_fails() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        assert_eq!(
            controller.start_scan().await,
            Err(ScanError::Failed(ScanFailure::NotInitialized))
        );
        assert_eq!(radio.stats().acquire_attempts, 0);
    }

    #[tokio::test]
    async fn test_degraded_radio_fails_fast() {
        let (radio, controller) = controller(SimulatedRadioConfig {
            start_error: Some("firmware missing".into()),
            ..Default::default()
        });
        let err = controller.initialize().await.unwrap_err();
        assert!(matches!(err, InitError::InitializationFailure(_)));
        assert_eq!(controller.state().kind(), ScanStateKind::Idle);

        assert!(matches!(
            controller.start_scan().await,
            Err(ScanError::Failed(ScanFailure::Degraded(_)))
        ));
        assert_eq!(radio.stats().acquire_attempts, 0);
    }

    #[tokio::test]
    async fn test_probe_error_means_unsupported() {
        let (_radio, controller) = controller(SimulatedRadioConfig {
            probe_error: Some("binder died".into()),
            ..Default::default()
        });
        assert_eq!(
            controller.initialize().await,
            Err(InitError::UnsupportedHardware)
        );
        assert_eq!(controller.state(), ScanState::Unsupported);
    }

    #[tokio::test]
    async fn test_queued_tag_is_read_and_released() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        radio.queue_tag(TagMetadata::with_id(TagId::parse("04:aa:bb:cc").unwrap()));

        let result = controller.start_scan().await.unwrap();
        assert_eq!(result.tag_id(), Some("04AABBCC"));
        assert_eq!(result.tech, NfcTech::Ndef);
        assert_eq!(controller.state().result(), Some(&result));

        let stats = radio.stats();
        assert_eq!(stats.acquisitions, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.outstanding_handles, 0);
    }

    #[tokio::test]
    async fn test_scan_from_result_is_rejected() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        radio.queue_tag(TagMetadata::anonymous());
        controller.start_scan().await.unwrap();

        assert_eq!(
            controller.start_scan().await,
            Err(ScanError::InvalidState(ScanStateKind::Result))
        );
        assert_eq!(radio.stats().acquire_attempts, 1);
    }

    #[tokio::test]
    async fn test_read_failure_returns_to_idle() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        radio.fail_next_read("tag moved away");

        let err = controller.start_scan().await.unwrap_err();
        assert_eq!(
            err,
            ScanError::Failed(ScanFailure::ReadFailed("Tag read failed: tag moved away".into()))
        );
        assert!(err.is_silent());
        assert_eq!(controller.state(), ScanState::Idle);
        assert_eq!(radio.stats().outstanding_handles, 0);
    }

    #[tokio::test]
    async fn test_cancel_and_reset_are_noops_when_idle() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        assert!(!controller.cancel());
        assert!(!controller.reset());
        assert_eq!(radio.stats().spurious_releases, 0);
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent() {
        let (radio, controller) = controller(SimulatedRadioConfig::default());
        controller.initialize().await.unwrap();
        controller.teardown();
        controller.teardown();

        assert!(controller.is_disposed());
        assert_eq!(
            controller.start_scan().await,
            Err(ScanError::Failed(ScanFailure::Disposed))
        );
        assert_eq!(controller.initialize().await, Err(InitError::Disposed));
        assert_eq!(radio.stats().spurious_releases, 0);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = ScanConfig::default();
        config.use_fallback = false;
        config.scan_timeout_secs = 0;
        let settings = ScanSettings::from(&config);
        assert_eq!(settings.primary, NfcTech::Ndef);
        assert_eq!(settings.fallback, None);
        assert_eq!(settings.timeout, None);
    }
}
