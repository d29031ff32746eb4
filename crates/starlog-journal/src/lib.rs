//! File layer for the Starlog journal engine.
//!
//! The running game writes two kinds of files into one directory:
//! append-only journal logs (`Journal.<date-time>.<part>.log`, one JSON
//! object per line, rotated into new numbered parts) and companion
//! snapshot files (a fixed set of basenames overwritten wholesale).
//! This crate owns everything that touches those files:
//!
//! - [`catalog`] -- filename recognition and chronological ordering
//! - [`source`] -- the replay-then-tail ingestion source
//! - [`companion`] -- the debounced snapshot reader
//! - [`watch`] -- the change-signal abstraction (polling, OS
//!   notifications, and a deterministic manual fake for tests)
//!
//! Reading and parsing stay on the single ingestion sequence; the watch
//! layer only signals that new bytes may exist.

pub mod catalog;
pub mod companion;
pub mod source;
pub mod watch;

pub use catalog::{JournalStamp, chronological, parse_journal_name, sort_newest_first};
pub use companion::{CompanionKind, SnapshotReader, SnapshotUpdate};
pub use source::{JournalSource, PollStats, ReplayStats, SourceError};
pub use watch::{ChangeSignal, FsEventSignal, ManualSignal, ManualTrigger, PollSignal};
