//! The game state manager: the single owner of the reconstructed state.
//!
//! [`GameStateManager`] holds the one [`GameState`] instance behind a
//! read-write lock and exposes the two contracts external collaborators
//! consume: [`GameStateManager::state`] (a point-in-time snapshot clone,
//! callable from any number of concurrent readers without blocking the
//! fold path beyond the clone itself) and the processed-event counters.
//!
//! The manager is constructed explicitly at process start and shared by
//! [`Arc`] handle -- there is no module-level singleton. It attaches to
//! the bus as an any-event subscriber and a snapshot subscriber; the
//! pure fold lives in [`crate::reducer`] and the manager adds the
//! bookkeeping around it (counters, the monotonic `last_updated`, and
//! the delta log line, which is the only side effect).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use starlog_events::JournalEvent;
use starlog_journal::SnapshotUpdate;
use starlog_types::{GameState, StateSlice};
use tracing::debug;

use crate::bus::{EventBus, SubscriptionId};
use crate::reducer;

/// Owns the reconstructed [`GameState`] and its liveness counters.
#[derive(Debug, Default)]
pub struct GameStateManager {
    state: RwLock<GameState>,
    events_processed: AtomicU64,
    snapshot_updates: AtomicU64,
}

impl GameStateManager {
    /// Create a manager holding an all-default, uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one journal event into the state.
    ///
    /// Increments `events_processed` by exactly one -- including for
    /// event kinds with no transition rule -- and advances
    /// `last_updated` monotonically to the event's own timestamp.
    /// Returns the slices the event changed.
    pub fn apply_event(&self, event: &JournalEvent) -> Vec<StateSlice> {
        let delta = {
            let mut state = self.write_state();
            let delta = reducer::fold_event(&mut state, event);
            state.touch(event.timestamp);
            delta
        };
        self.events_processed.fetch_add(1, Ordering::AcqRel);
        delta
    }

    /// Merge one companion snapshot update into the state.
    ///
    /// Counted separately from journal events in `snapshot_updates`.
    pub fn apply_snapshot(&self, update: &SnapshotUpdate) -> Vec<StateSlice> {
        let delta = {
            let mut state = self.write_state();
            let delta = reducer::merge_snapshot(&mut state, update);
            state.touch(update.timestamp);
            delta
        };
        self.snapshot_updates.fetch_add(1, Ordering::AcqRel);
        delta
    }

    /// Return a point-in-time copy of the state.
    ///
    /// The copy is never torn: it reflects the aggregate either entirely
    /// before or entirely after any given fold step. Callers may mutate
    /// their copy freely without affecting the engine.
    pub fn state(&self) -> GameState {
        self.read_state().clone()
    }

    /// Number of journal events folded so far (recognized or not).
    pub fn events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Acquire)
    }

    /// Number of companion snapshot updates merged so far.
    pub fn snapshot_updates(&self) -> u64 {
        self.snapshot_updates.load(Ordering::Acquire)
    }

    /// Subscribe a manager to a bus: an any-event handler that folds
    /// journal events and a snapshot handler that merges companion
    /// updates. Returns both subscription ids.
    ///
    /// The handlers log each non-empty delta at debug level; that side
    /// effect stays out of the pure fold.
    pub fn attach(manager: &Arc<Self>, bus: &mut EventBus) -> (SubscriptionId, SubscriptionId) {
        let fold_manager = Arc::clone(manager);
        let journal_id = bus.subscribe_any(move |event| {
            let delta = fold_manager.apply_event(event);
            if !delta.is_empty() {
                debug!(
                    kind = %event.name,
                    slices = ?delta.iter().map(|s| s.name()).collect::<Vec<_>>(),
                    "event folded"
                );
            }
            Ok(())
        });

        let merge_manager = Arc::clone(manager);
        let snapshot_id = bus.subscribe_snapshot(move |update| {
            let delta = merge_manager.apply_snapshot(update);
            if !delta.is_empty() {
                debug!(
                    file = update.kind.file_name(),
                    slices = ?delta.iter().map(|s| s.name()).collect::<Vec<_>>(),
                    "snapshot merged"
                );
            }
            Ok(())
        });

        (journal_id, snapshot_id)
    }

    /// Acquire the write guard, recovering from poisoning.
    ///
    /// The fold path cannot panic (workspace lint regime), so a
    /// poisoned lock can only come from a panicking reader clone, in
    /// which case the data is still consistent.
    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, GameState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the read guard, recovering from poisoning.
    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, GameState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use starlog_events::parse_line;

    use super::*;

    fn event(json: &str) -> JournalEvent {
        parse_line(json).unwrap()
    }

    #[test]
    fn counter_increments_once_per_event_even_for_unknown_kinds() {
        let manager = GameStateManager::new();
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Commander":"Jamie"}"#,
        ));
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:01:00Z","event":"NoSuchRule"}"#,
        ));

        assert_eq!(manager.events_processed(), 2);
        assert_eq!(manager.snapshot_updates(), 0);
    }

    #[test]
    fn last_updated_tracks_event_timestamps_monotonically() {
        let manager = GameStateManager::new();
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:05:00Z","event":"LoadGame"}"#,
        ));
        let after_first = manager.state().last_updated.unwrap();

        // An out-of-order historical event may be replayed; the clock
        // must not rewind.
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:01:00Z","event":"Scan"}"#,
        ));
        assert_eq!(manager.state().last_updated, Some(after_first));

        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:10:00Z","event":"Scan"}"#,
        ));
        assert!(manager.state().last_updated.unwrap() > after_first);
    }

    #[test]
    fn state_returns_an_independent_copy() {
        let manager = GameStateManager::new();
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Commander":"Jamie"}"#,
        ));

        let mut copy = manager.state();
        copy.commander.name = "Tampered".to_owned();

        assert_eq!(manager.state().commander.name, "Jamie");
    }

    #[test]
    fn attach_folds_through_the_bus() {
        let manager = Arc::new(GameStateManager::new());
        let mut bus = EventBus::new();
        GameStateManager::attach(&manager, &mut bus);

        bus.publish(&event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Commander":"Jamie","Credits":1000}"#,
        ));
        bus.publish(&event(
            r#"{"timestamp":"2024-01-01T00:05:00Z","event":"FSDJump","StarSystem":"Sol","JumpDist":10,"FuelUsed":2}"#,
        ));

        let state = manager.state();
        assert_eq!(state.commander.name, "Jamie");
        assert_eq!(state.session.jumps, 1);
        assert_eq!(state.location.system, "Sol");
        assert_eq!(manager.events_processed(), 2);
    }

    #[test]
    fn concurrent_readers_never_block_each_other_out_of_a_snapshot() {
        let manager = Arc::new(GameStateManager::new());
        manager.apply_event(&event(
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"LoadGame","Commander":"Jamie"}"#,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reader = Arc::clone(&manager);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let state = reader.state();
                        assert_eq!(state.commander.name, "Jamie");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
