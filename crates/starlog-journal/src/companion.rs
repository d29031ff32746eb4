//! Companion snapshot files: detection, parsing, and debouncing.
//!
//! Unlike the append-only journal, companion files are overwritten
//! wholesale by the game and represent the latest point-in-time truth for
//! one narrow concern each (real-time status flags, the cargo manifest,
//! the plotted route...). The reader compares parsed content against the
//! last seen value -- not the file's mtime -- so identical rewrites never
//! re-trigger downstream notification.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

/// The fixed set of companion snapshot files the engine watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompanionKind {
    /// Real-time status flags and surface coordinates.
    Status,
    /// Current cargo manifest.
    Cargo,
    /// The plotted navigation route.
    NavRoute,
    /// Outfitted module list.
    Modules,
    /// On-foot backpack contents.
    Backpack,
    /// Ship locker contents.
    ShipLocker,
}

/// All watched companion kinds, in polling order.
pub const ALL_COMPANIONS: [CompanionKind; 6] = [
    CompanionKind::Status,
    CompanionKind::Cargo,
    CompanionKind::NavRoute,
    CompanionKind::Modules,
    CompanionKind::Backpack,
    CompanionKind::ShipLocker,
];

impl CompanionKind {
    /// The basename the game writes this snapshot under.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Status => "Status.json",
            Self::Cargo => "Cargo.json",
            Self::NavRoute => "NavRoute.json",
            Self::Modules => "ModulesInfo.json",
            Self::Backpack => "Backpack.json",
            Self::ShipLocker => "ShipLocker.json",
        }
    }

    /// Map a basename to its kind, if it is a known companion file.
    pub fn from_file_name(name: &str) -> Option<Self> {
        ALL_COMPANIONS
            .into_iter()
            .find(|kind| kind.file_name() == name)
    }
}

/// A change notification for one companion snapshot.
///
/// Kept separate from journal events on the bus: a snapshot supersedes
/// its predecessor entirely rather than appending to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotUpdate {
    /// Which companion file changed.
    pub kind: CompanionKind,
    /// The full parsed content of the new version.
    pub payload: Value,
    /// The snapshot's own timestamp when it carries one, otherwise the
    /// time the change was observed.
    pub timestamp: DateTime<Utc>,
}

/// Polling reader over the fixed companion file set.
///
/// Owns the last successfully parsed value per file and emits a
/// [`SnapshotUpdate`] only when the parsed content differs from it.
#[derive(Debug)]
pub struct SnapshotReader {
    dir: PathBuf,
    last_seen: BTreeMap<CompanionKind, Value>,
}

impl SnapshotReader {
    /// Create a reader over the given journal directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_seen: BTreeMap::new(),
        }
    }

    /// The directory being watched.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Check every known companion file and return the updates whose
    /// content actually changed since the last poll.
    ///
    /// Missing files, unreadable files, and files that fail to parse
    /// (the game overwrites them non-atomically, so a mid-write read is
    /// expected) are skipped silently and retried on the next poll.
    pub fn poll(&mut self) -> Vec<SnapshotUpdate> {
        let mut updates = Vec::new();

        for kind in ALL_COMPANIONS {
            let path = self.dir.join(kind.file_name());
            let contents = match std::fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    trace!(file = kind.file_name(), error = %err, "companion file unreadable");
                    continue;
                }
            };

            let Ok(payload) = serde_json::from_str::<Value>(&contents) else {
                trace!(file = kind.file_name(), "companion file mid-write, retrying next poll");
                continue;
            };

            if self.last_seen.get(&kind) == Some(&payload) {
                continue;
            }

            let timestamp = embedded_timestamp(&payload).unwrap_or_else(Utc::now);
            self.last_seen.insert(kind, payload.clone());
            updates.push(SnapshotUpdate {
                kind,
                payload,
                timestamp,
            });
        }

        updates
    }

    /// Forget all remembered content, forcing every file to re-publish
    /// on the next poll. Used when the directory reappears after an
    /// outage so downstream state is rebuilt from current truth.
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }
}

/// Read the `timestamp` field a snapshot usually embeds.
fn embedded_timestamp(payload: &Value) -> Option<DateTime<Utc>> {
    payload
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|fixed| fixed.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn known_basenames_round_trip() {
        for kind in ALL_COMPANIONS {
            assert_eq!(CompanionKind::from_file_name(kind.file_name()), Some(kind));
        }
        assert_eq!(CompanionKind::from_file_name("Market.json"), None);
        assert_eq!(
            CompanionKind::from_file_name("Journal.2024-08-15T180000.01.log"),
            None
        );
    }

    #[test]
    fn first_read_publishes_once() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Status.json",
            r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Status","Flags":16842765}"#,
        );

        let mut reader = SnapshotReader::new(dir.path());
        let updates = reader.poll();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates.first().map(|u| u.kind), Some(CompanionKind::Status));

        // Identical content on the next poll is debounced.
        assert!(reader.poll().is_empty());
    }

    #[test]
    fn identical_rewrite_is_debounced_but_changes_publish() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Status","Flags":1}"#;
        write(dir.path(), "Status.json", v1);

        let mut reader = SnapshotReader::new(dir.path());
        assert_eq!(reader.poll().len(), 1);

        // Rewrite the same bytes: mtime changes, content does not.
        write(dir.path(), "Status.json", v1);
        assert!(reader.poll().is_empty());

        // A real change publishes exactly once.
        write(
            dir.path(),
            "Status.json",
            r#"{"timestamp":"2024-01-01T00:01:00Z","event":"Status","Flags":5}"#,
        );
        let updates = reader.poll();
        assert_eq!(updates.len(), 1);
        assert!(reader.poll().is_empty());
    }

    #[test]
    fn unparseable_content_is_skipped_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Cargo.json", "{half a json");

        let mut reader = SnapshotReader::new(dir.path());
        assert!(reader.poll().is_empty());

        write(
            dir.path(),
            "Cargo.json",
            r#"{"timestamp":"2024-01-01T00:00:00Z","Vessel":"Ship","Inventory":[]}"#,
        );
        assert_eq!(reader.poll().len(), 1);
    }

    #[test]
    fn missing_directory_yields_no_updates() {
        let mut reader = SnapshotReader::new("/definitely/not/a/real/path");
        assert!(reader.poll().is_empty());
    }

    #[test]
    fn reset_republishes_current_content() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Backpack.json",
            r#"{"timestamp":"2024-01-01T00:00:00Z","Items":[]}"#,
        );

        let mut reader = SnapshotReader::new(dir.path());
        assert_eq!(reader.poll().len(), 1);
        assert!(reader.poll().is_empty());

        reader.reset();
        assert_eq!(reader.poll().len(), 1);
    }

    #[test]
    fn embedded_timestamp_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Status.json",
            r#"{"timestamp":"2024-03-05T12:30:00Z","Flags":0}"#,
        );

        let mut reader = SnapshotReader::new(dir.path());
        let updates = reader.poll();
        let update = updates.first().unwrap();
        assert_eq!(
            update.timestamp.to_rfc3339(),
            "2024-03-05T12:30:00+00:00"
        );
    }
}
