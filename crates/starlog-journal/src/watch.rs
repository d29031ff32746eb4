//! Change-signal abstraction for the ingestion loop.
//!
//! The runner never reads files eagerly: it waits for a [`ChangeSignal`]
//! to resolve, then asks the source and the snapshot reader to poll. The
//! signal only ever means "new bytes *may* exist" -- detection is
//! decoupled from reading, and the actual read-and-fold always happens on
//! the single ingestion sequence.
//!
//! Three implementations cover production and tests:
//!
//! - [`PollSignal`] fires on a fixed interval (the default; the journal
//!   grows every few seconds while the game runs, so a short interval is
//!   indistinguishable from push notification in practice).
//! - [`FsEventSignal`] resolves on OS file-system notifications, with the
//!   interval as a fallback so a dropped notification or an unwatchable
//!   directory can never stall ingestion.
//! - [`ManualSignal`] fires only when a test triggers it, which makes
//!   ingestion-ordering tests deterministic and independent of real
//!   file-system timing.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Resolves when the watched directory may have changed.
pub trait ChangeSignal {
    /// Wait until new bytes may exist (or a timeout policy decides the
    /// caller should look anyway).
    fn wait(&mut self) -> impl Future<Output = ()> + Send;
}

/// Fixed-interval polling signal.
#[derive(Debug, Clone, Copy)]
pub struct PollSignal {
    interval: Duration,
}

impl PollSignal {
    /// Create a signal that fires every `interval`.
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl ChangeSignal for PollSignal {
    async fn wait(&mut self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// OS file-system notification signal with interval fallback.
///
/// The watch is established lazily and re-established after failure, so
/// a directory that does not exist yet (degraded startup) simply falls
/// back to interval polling until it appears.
pub struct FsEventSignal {
    dir: PathBuf,
    fallback: Duration,
    rx: mpsc::UnboundedReceiver<()>,
    tx: mpsc::UnboundedSender<()>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for FsEventSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsEventSignal")
            .field("dir", &self.dir)
            .field("fallback", &self.fallback)
            .field("watching", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl FsEventSignal {
    /// Create a signal for `dir` with the given fallback interval.
    pub fn new(dir: impl Into<PathBuf>, fallback: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut signal = Self {
            dir: dir.into(),
            fallback,
            rx,
            tx,
            watcher: None,
        };
        signal.establish();
        signal
    }

    /// Try to (re-)establish the OS watch. Failure is not an error:
    /// the fallback interval covers until the directory is watchable.
    fn establish(&mut self) {
        if self.watcher.is_some() {
            return;
        }

        let tx = self.tx.clone();
        let watcher = notify::recommended_watcher(move |result: Result<notify::Event, notify::Error>| {
            match result {
                // The receiver only cares that something happened; the
                // poll that follows works out what.
                Ok(_) => {
                    let _ = tx.send(());
                }
                Err(err) => {
                    trace!(error = %err, "file watcher error");
                }
            }
        });

        match watcher {
            Ok(mut watcher) => match watcher.watch(&self.dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!(dir = %self.dir.display(), "file-system watch established");
                    self.watcher = Some(watcher);
                }
                Err(err) => {
                    trace!(dir = %self.dir.display(), error = %err, "cannot watch directory yet");
                }
            },
            Err(err) => {
                trace!(error = %err, "cannot create file watcher");
            }
        }
    }

    /// The watched directory.
    pub fn directory(&self) -> &Path {
        &self.dir
    }
}

impl ChangeSignal for FsEventSignal {
    async fn wait(&mut self) {
        self.establish();
        tokio::select! {
            notification = self.rx.recv() => {
                if notification.is_none() {
                    // Sender half gone (cannot happen while `tx` is held,
                    // but select must not busy-loop if it ever does).
                    tokio::time::sleep(self.fallback).await;
                }
            }
            () = tokio::time::sleep(self.fallback) => {}
        }
    }
}

/// Deterministic test signal, fired explicitly via [`ManualTrigger`].
#[derive(Debug)]
pub struct ManualSignal {
    notify: Arc<Notify>,
}

/// Handle used by tests to fire a [`ManualSignal`].
#[derive(Debug, Clone)]
pub struct ManualTrigger {
    notify: Arc<Notify>,
}

impl ManualSignal {
    /// Create a signal and the trigger that fires it.
    pub fn new() -> (Self, ManualTrigger) {
        let notify = Arc::new(Notify::new());
        (
            Self {
                notify: Arc::clone(&notify),
            },
            ManualTrigger { notify },
        )
    }
}

impl ManualTrigger {
    /// Fire the signal once. A trigger with no waiter is remembered and
    /// consumed by the next wait.
    pub fn fire(&self) {
        self.notify.notify_one();
    }
}

impl ChangeSignal for ManualSignal {
    async fn wait(&mut self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn poll_signal_fires_on_the_interval() {
        let mut signal = PollSignal::new(Duration::from_millis(500));
        // With paused time this returns immediately once the clock
        // auto-advances; the assertion is that it resolves at all.
        signal.wait().await;
    }

    #[tokio::test]
    async fn manual_signal_fires_only_when_triggered() {
        let (mut signal, trigger) = ManualSignal::new();

        trigger.fire();
        signal.wait().await;

        // No pending trigger: wait must not resolve.
        let pending = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn fs_event_signal_falls_back_on_missing_directory() {
        let mut signal =
            FsEventSignal::new("/definitely/not/a/real/path", Duration::from_millis(10));
        // The watch cannot be established; the fallback interval must
        // still resolve the wait.
        tokio::time::timeout(Duration::from_millis(500), signal.wait())
            .await
            .unwrap();
    }
}
