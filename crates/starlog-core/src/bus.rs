//! The typed publish/subscribe event bus.
//!
//! Producers (the ingestion runner) publish journal events and companion
//! snapshot updates; consumers register handlers in one of three modes:
//! for one exact event kind, for every journal event, or for snapshot
//! updates only.
//!
//! Dispatch is synchronous and in registration order: all matching
//! handlers complete before the bus accepts the next item. This is an
//! explicit backpressure trade-off -- a slow handler delays ingestion,
//! so handlers that need slow I/O must hand off to their own background
//! task instead of blocking here.
//!
//! A handler failure is caught at the dispatch boundary: it is logged,
//! counted, and never propagates to the ingestion source nor suppresses
//! other handlers for the same or subsequent events.

use starlog_events::JournalEvent;
use starlog_journal::SnapshotUpdate;
use tracing::warn;
use uuid::Uuid;

/// An error returned by a subscriber's handler.
///
/// Handler failures are isolated per handler and surface only as logs
/// and the bus failure counter.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// The handler could not process the item.
    #[error("subscriber failed: {message}")]
    Failed {
        /// Description of what went wrong.
        message: String,
    },
}

impl SubscriberError {
    /// Convenience constructor for a failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Unwrap to the underlying UUID.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Handler for journal events.
pub type JournalHandler = Box<dyn FnMut(&JournalEvent) -> Result<(), SubscriberError> + Send>;

/// Handler for companion snapshot updates.
pub type SnapshotHandler = Box<dyn FnMut(&SnapshotUpdate) -> Result<(), SubscriberError> + Send>;

/// What a journal subscription matches.
enum JournalFilter {
    /// Only events whose raw name equals this kind.
    Kind(String),
    /// Every journal event.
    Any,
}

struct JournalSubscription {
    id: SubscriptionId,
    filter: JournalFilter,
    handler: JournalHandler,
}

struct SnapshotSubscription {
    id: SubscriptionId,
    handler: SnapshotHandler,
}

/// The in-process typed publish/subscribe hub.
#[derive(Default)]
pub struct EventBus {
    journal: Vec<JournalSubscription>,
    snapshot: Vec<SnapshotSubscription>,
    handler_failures: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("journal_subscribers", &self.journal.len())
            .field("snapshot_subscribers", &self.snapshot.len())
            .field("handler_failures", &self.handler_failures)
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one exact event kind (matched against the
    /// raw event name, so subscribing to a kind this engine version does
    /// not recognize still works).
    pub fn subscribe(
        &mut self,
        kind: impl Into<String>,
        handler: impl FnMut(&JournalEvent) -> Result<(), SubscriberError> + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.journal.push(JournalSubscription {
            id,
            filter: JournalFilter::Kind(kind.into()),
            handler: Box::new(handler),
        });
        id
    }

    /// Register a handler invoked for every journal event.
    pub fn subscribe_any(
        &mut self,
        handler: impl FnMut(&JournalEvent) -> Result<(), SubscriberError> + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.journal.push(JournalSubscription {
            id,
            filter: JournalFilter::Any,
            handler: Box::new(handler),
        });
        id
    }

    /// Register a handler invoked for companion snapshot updates only.
    pub fn subscribe_snapshot(
        &mut self,
        handler: impl FnMut(&SnapshotUpdate) -> Result<(), SubscriberError> + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.snapshot.push(SnapshotSubscription {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let journal_before = self.journal.len();
        let snapshot_before = self.snapshot.len();
        self.journal.retain(|sub| sub.id != id);
        self.snapshot.retain(|sub| sub.id != id);
        self.journal.len() != journal_before || self.snapshot.len() != snapshot_before
    }

    /// Dispatch one journal event to every matching handler, in
    /// registration order. Returns only when all handlers have run.
    pub fn publish(&mut self, event: &JournalEvent) {
        for sub in &mut self.journal {
            let matches = match &sub.filter {
                JournalFilter::Kind(kind) => kind == &event.name,
                JournalFilter::Any => true,
            };
            if !matches {
                continue;
            }
            if let Err(err) = (sub.handler)(event) {
                self.handler_failures = self.handler_failures.saturating_add(1);
                warn!(
                    subscription = %sub.id,
                    kind = %event.name,
                    error = %err,
                    "journal subscriber failed"
                );
            }
        }
    }

    /// Dispatch one snapshot update to every snapshot handler, in
    /// registration order.
    pub fn publish_snapshot(&mut self, update: &SnapshotUpdate) {
        for sub in &mut self.snapshot {
            if let Err(err) = (sub.handler)(update) {
                self.handler_failures = self.handler_failures.saturating_add(1);
                warn!(
                    subscription = %sub.id,
                    file = update.kind.file_name(),
                    error = %err,
                    "snapshot subscriber failed"
                );
            }
        }
    }

    /// Total handler failures since the bus was created.
    pub const fn handler_failures(&self) -> u64 {
        self.handler_failures
    }

    /// Number of registered journal subscriptions (both modes).
    pub fn journal_subscriber_count(&self) -> usize {
        self.journal.len()
    }

    /// Number of registered snapshot subscriptions.
    pub fn snapshot_subscriber_count(&self) -> usize {
        self.snapshot.len()
    }
}
