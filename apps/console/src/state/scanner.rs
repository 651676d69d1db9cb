//! # Scanner State
//!
//! Owns the scan controller, the simulated radio it drives, and the
//! background task of the scan in progress.
//!
//! `start_scan` only returns once a tag is read or the session ends, so the
//! console runs it on a spawned task and keeps reading commands (`tap`,
//! `cancel`) while it waits.

use std::sync::{Arc, Mutex};

use guardia_core::{ScanState, ScanView, TagReadResult};
use guardia_nfc::{
    ScanEventEmitter, ScanResult, ScanSessionController, ScanSettings, ScannerConfig,
    SimulatedRadio,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AppError;

/// Scanner wrapper shared by the command handlers.
pub struct ScannerState {
    controller: Arc<ScanSessionController>,
    radio: Arc<SimulatedRadio>,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

impl ScannerState {
    /// Builds a controller over `radio` with the scan settings from `config`.
    pub fn new(
        radio: Arc<SimulatedRadio>,
        config: &ScannerConfig,
        emitter: Arc<dyn ScanEventEmitter>,
    ) -> Self {
        let controller = ScanSessionController::with_emitter(
            radio.clone(),
            ScanSettings::from(&config.scan),
            emitter,
        );
        ScannerState {
            controller: Arc::new(controller),
            radio,
            scan_task: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &ScanSessionController {
        &self.controller
    }

    pub fn radio(&self) -> &SimulatedRadio {
        &self.radio
    }

    /// Projects the current state for display.
    pub fn view(&self, unknown_label: &str) -> ScanView {
        ScanView::project(&self.controller.state(), unknown_label)
    }

    /// Starts a scan on a background task.
    ///
    /// Returns once the controller has entered `Scanning` or the attempt has
    /// already ended. Failures the operator must see are printed.
    pub async fn spawn_scan(&self) {
        let mut rx = self.controller.subscribe();
        let controller = self.controller.clone();

        let mut task = tokio::spawn(async move {
            let outcome = controller.start_scan().await;
            report_outcome(outcome);
        });

        tokio::select! {
            biased;
            _ = &mut task => {
                debug!("Scan ended before entering Scanning");
            }
            _ = async { rx.wait_for(ScanState::is_scanning).await.is_ok() } => {
                let previous = self.task_slot().replace(task);
                if let Some(previous) = previous {
                    if !previous.is_finished() {
                        warn!("Replacing a scan task that is still running");
                    }
                }
            }
        }
    }

    /// Tears the controller down and waits for the scan task to finish.
    pub async fn shutdown(&self) {
        self.controller.teardown();

        let task = self.task_slot().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Scan task did not finish cleanly");
            }
        }
        info!("Scanner shut down");
    }

    fn task_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.scan_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Reports how a scan ended.
///
/// Successful reads are already shown by the state change. Cancellations and
/// failed reads return to idle quietly.
fn report_outcome(outcome: ScanResult<TagReadResult>) {
    match outcome {
        Ok(result) => {
            info!(session = %result.session_id, tech = %result.tech, "Tag read");
        }
        Err(err) if err.is_silent() => {
            debug!(error = %err, retryable = err.is_retryable(), "Scan ended without a tag");
        }
        Err(err) => {
            warn!(error = %err, "Scan rejected");
            println!("{}", AppError::from(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardia_core::{ScanStateKind, TagId};
    use guardia_nfc::{NoOpEmitter, SimulatedRadioConfig};

    fn scanner(config: SimulatedRadioConfig) -> ScannerState {
        ScannerState::new(
            Arc::new(SimulatedRadio::new(config)),
            &ScannerConfig::default(),
            Arc::new(NoOpEmitter),
        )
    }

    #[tokio::test]
    async fn test_spawn_scan_returns_while_scanning() {
        let scanner = scanner(SimulatedRadioConfig::default());
        scanner.controller().initialize().await.unwrap();

        scanner.spawn_scan().await;
        assert!(scanner.controller().state().is_scanning());
        assert!(scanner.radio().held_technology().is_some());

        assert!(scanner
            .radio()
            .present_tag(TagId::parse("04A22B").unwrap()));
        let mut rx = scanner.controller().subscribe();
        rx.wait_for(|s| s.result().is_some()).await.unwrap();

        let view = scanner.view("Unknown");
        assert_eq!(view.mode, ScanStateKind::Result);
        assert_eq!(view.card.unwrap().detail, "ID: 04A22B");
        assert!(scanner.radio().held_technology().is_none());
    }

    #[tokio::test]
    async fn test_spawn_scan_on_unsupported_device_returns() {
        let scanner = scanner(SimulatedRadioConfig::unsupported());
        assert!(scanner.controller().initialize().await.is_err());

        scanner.spawn_scan().await;
        assert_eq!(scanner.controller().state().kind(), ScanStateKind::Unsupported);
        assert_eq!(scanner.radio().stats().acquire_attempts, 0);
    }

    #[tokio::test]
    async fn test_shutdown_ends_pending_scan() {
        let scanner = scanner(SimulatedRadioConfig::default());
        scanner.controller().initialize().await.unwrap();
        scanner.spawn_scan().await;

        scanner.shutdown().await;
        assert!(scanner.controller().is_disposed());
        let stats = scanner.radio().stats();
        assert_eq!(stats.acquisitions, stats.releases);
    }
}
