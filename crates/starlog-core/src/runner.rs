//! The ingestion runner: replay, tail, degrade, stop.
//!
//! [`run_ingestion`] is the single writer of the whole engine. It drives
//! the state machine
//!
//! ```text
//! Starting -> Replaying -> Tailing <-> Degraded -> Stopped
//! ```
//!
//! reading lines strictly one at a time and publishing each to the bus
//! before touching the next -- bus dispatch is synchronous, so fold
//! order equals file order and reconstruction is deterministic.
//!
//! `Degraded` is entered whenever the journal directory is missing or
//! unreadable; the runner stays alive, retries on a fixed interval, and
//! on recovery re-enumerates from scratch (passing through `Replaying`
//! again -- duplicate redelivery after an outage is an accepted
//! restart-equivalent cost, never a steady-state tailing cost).
//! `Stopped` is terminal and reached only via [`EngineControl::request_stop`];
//! an in-flight fold completes, no new lines are accepted afterward, and
//! no file handle is held across waits, so stop returns promptly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use starlog_journal::{ChangeSignal, JournalSource, SnapshotReader};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::bus::EventBus;

/// The ingestion state machine's observable status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    /// The runner has not begun enumeration yet.
    Starting,
    /// Historical files are being replayed.
    Replaying,
    /// Live tailing of file growth and new files.
    Tailing,
    /// The journal directory is unavailable; retrying on an interval.
    Degraded,
    /// Terminal: the runner has exited after an explicit stop.
    Stopped,
}

impl IngestStatus {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Replaying => 1,
            Self::Tailing => 2,
            Self::Degraded => 3,
            Self::Stopped => 4,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Replaying,
            2 => Self::Tailing,
            3 => Self::Degraded,
            4 => Self::Stopped,
            _ => Self::Starting,
        }
    }
}

/// Shared control handle for the ingestion runner.
///
/// Wrapped in [`Arc`] and shared between the runner task and whoever
/// owns shutdown (signal handlers, tests). Atomic fields keep status
/// reads lock-free.
#[derive(Debug, Default)]
pub struct EngineControl {
    status: AtomicU8,
    stop_requested: AtomicBool,
    stop_notify: Notify,
}

impl EngineControl {
    /// Create a control handle in the `Starting` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The runner's current status.
    pub fn status(&self) -> IngestStatus {
        IngestStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: IngestStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    /// Request a clean stop. The runner finishes its in-flight fold,
    /// releases its watchers, and exits.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until a stop is requested. Returns immediately if one
    /// already was.
    pub async fn stopped(&self) {
        while !self.stop_requested.load(Ordering::Acquire) {
            self.stop_notify.notified().await;
        }
    }
}

/// Counters describing one complete runner lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Journal files read during replay passes.
    pub files_replayed: u64,
    /// Lines parsed and published (replay and tail combined).
    pub lines_delivered: u64,
    /// Non-empty lines dropped as unparseable.
    pub parse_failures: u64,
    /// Companion snapshot updates published.
    pub snapshot_updates: u64,
    /// Times the runner entered the degraded state.
    pub degraded_entries: u64,
    /// Replay passes executed (one, plus one per degraded recovery).
    pub replay_passes: u64,
}

/// Run the ingestion loop until a stop is requested.
///
/// Owns the bus for its lifetime: every subscriber must be registered
/// before the runner starts. Events flow `source -> parser -> bus`
/// synchronously; the change `signal` only schedules polls and never
/// carries data.
pub async fn run_ingestion<S: ChangeSignal>(
    mut source: JournalSource,
    mut reader: SnapshotReader,
    mut bus: EventBus,
    control: &Arc<EngineControl>,
    signal: &mut S,
    retry_interval: Duration,
) -> IngestionReport {
    let mut report = IngestionReport::default();
    control.set_status(IngestStatus::Starting);
    info!(directory = %source.directory().display(), "ingestion starting");

    'run: loop {
        // --- Replay phase (initial startup and degraded recovery) ---
        control.set_status(IngestStatus::Replaying);
        report.replay_passes = report.replay_passes.saturating_add(1);

        match source.replay(|event| bus.publish(&event)) {
            Ok(stats) => {
                report.files_replayed = report.files_replayed.saturating_add(stats.files);
                report.lines_delivered = report.lines_delivered.saturating_add(stats.lines);
                report.parse_failures = report.parse_failures.saturating_add(stats.parse_failures);
                info!(
                    files = stats.files,
                    lines = stats.lines,
                    parse_failures = stats.parse_failures,
                    active = ?source.active_file(),
                    "replay complete, tailing"
                );
                control.set_status(IngestStatus::Tailing);
            }
            Err(err) => {
                if enter_degraded(control, &mut report, &err, retry_interval).await {
                    break 'run;
                }
                source.reset();
                reader.reset();
                continue 'run;
            }
        }

        publish_snapshots(&mut reader, &mut bus, &mut report);

        // --- Tail phase ---
        loop {
            tokio::select! {
                () = signal.wait() => {}
                () = control.stopped() => break 'run,
            }
            if control.is_stop_requested() {
                break 'run;
            }

            match source.poll(|event| bus.publish(&event)) {
                Ok(stats) => {
                    report.lines_delivered = report.lines_delivered.saturating_add(stats.lines);
                    report.parse_failures =
                        report.parse_failures.saturating_add(stats.parse_failures);
                    if stats.rotated {
                        info!(active = ?source.active_file(), "journal rotated");
                    }
                }
                Err(err) => {
                    if enter_degraded(control, &mut report, &err, retry_interval).await {
                        break 'run;
                    }
                    source.reset();
                    reader.reset();
                    continue 'run;
                }
            }

            publish_snapshots(&mut reader, &mut bus, &mut report);
        }
    }

    control.set_status(IngestStatus::Stopped);
    info!(
        lines = report.lines_delivered,
        parse_failures = report.parse_failures,
        snapshot_updates = report.snapshot_updates,
        degraded_entries = report.degraded_entries,
        "ingestion stopped"
    );
    report
}

/// Publish whatever companion snapshots changed since the last look.
fn publish_snapshots(reader: &mut SnapshotReader, bus: &mut EventBus, report: &mut IngestionReport) {
    for update in reader.poll() {
        bus.publish_snapshot(&update);
        report.snapshot_updates = report.snapshot_updates.saturating_add(1);
    }
}

/// Flip to degraded and wait out the retry interval. Returns true when
/// the wait ended because a stop was requested.
async fn enter_degraded(
    control: &Arc<EngineControl>,
    report: &mut IngestionReport,
    err: &starlog_journal::SourceError,
    retry_interval: Duration,
) -> bool {
    if control.status() != IngestStatus::Degraded {
        warn!(error = %err, "journal directory unavailable, entering degraded state");
        control.set_status(IngestStatus::Degraded);
        report.degraded_entries = report.degraded_entries.saturating_add(1);
    }

    tokio::select! {
        () = tokio::time::sleep(retry_interval) => false,
        () = control.stopped() => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_the_atomic_encoding() {
        for status in [
            IngestStatus::Starting,
            IngestStatus::Replaying,
            IngestStatus::Tailing,
            IngestStatus::Degraded,
            IngestStatus::Stopped,
        ] {
            assert_eq!(IngestStatus::from_u8(status.as_u8()), status);
        }
    }

    #[test]
    fn control_starts_in_starting_without_stop() {
        let control = EngineControl::new();
        assert_eq!(control.status(), IngestStatus::Starting);
        assert!(!control.is_stop_requested());
    }

    #[tokio::test]
    async fn stopped_resolves_after_request_stop() {
        let control = Arc::new(EngineControl::new());

        // Request before waiting: the permit is consumed immediately.
        control.request_stop();
        control.stopped().await;
        assert!(control.is_stop_requested());
    }

    #[tokio::test]
    async fn stopped_resolves_when_requested_concurrently() {
        let control = Arc::new(EngineControl::new());
        let waiter = Arc::clone(&control);
        let handle = tokio::spawn(async move { waiter.stopped().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        control.request_stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
