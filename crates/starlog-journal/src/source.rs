//! The replay-then-tail journal ingestion source.
//!
//! [`JournalSource`] delivers every line of every matching journal file in
//! file-chronological and intra-file order, exactly once: first by
//! replaying all existing files oldest-first, then by tailing growth of
//! the newest file and adopting newly created parts. The byte offset
//! reached at the end of replay becomes the tail cursor, so the
//! replay-to-tail transition has no gap and no duplicate.
//!
//! The source is synchronous and pull-based: the ingestion runner decides
//! when to call [`JournalSource::poll`], typically after a change signal
//! fires. Nothing here holds a file handle across calls -- every poll
//! opens, seeks, reads, and closes, which keeps shutdown prompt and
//! tolerates the directory vanishing at any point.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use starlog_events::{JournalEvent, parse_line};
use tracing::{trace, warn};

use crate::catalog::{JournalStamp, parse_journal_name};

/// Errors from the ingestion source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The journal directory is missing or unreadable. The engine enters
    /// its degraded state and retries on a fixed interval.
    #[error("journal directory unavailable: {source}")]
    Unavailable {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Counters from a full replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Journal files read.
    pub files: u64,
    /// Lines successfully parsed and delivered.
    pub lines: u64,
    /// Non-empty lines that failed to parse and were dropped.
    pub parse_failures: u64,
}

/// Counters from one tail poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Lines successfully parsed and delivered.
    pub lines: u64,
    /// Non-empty lines that failed to parse and were dropped.
    pub parse_failures: u64,
    /// Whether the active file changed during this poll.
    pub rotated: bool,
}

/// Reassembles complete lines from arbitrarily split chunks.
///
/// A read may end mid-line; the trailing fragment is buffered until the
/// bytes that complete it arrive.
#[derive(Debug, Default)]
struct LineAssembler {
    pending: String,
}

impl LineAssembler {
    /// Feed a chunk, invoking `f` once per completed line (without the
    /// terminator). The trailing fragment, if any, stays buffered.
    fn push(&mut self, chunk: &str, mut f: impl FnMut(&str)) {
        let mut buf = std::mem::take(&mut self.pending);
        buf.push_str(chunk);
        let mut rest = buf.as_str();
        while let Some((line, tail)) = rest.split_once('\n') {
            f(line);
            rest = tail;
        }
        self.pending = rest.to_owned();
    }

    /// Emit the buffered fragment as a final line. Only valid once the
    /// file can no longer grow (it was rotated away from).
    fn flush(&mut self, mut f: impl FnMut(&str)) {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            f(&line);
        }
    }

    /// Discard the buffered fragment (file truncated or replaced).
    fn clear(&mut self) {
        self.pending.clear();
    }
}

/// The file currently being tailed.
#[derive(Debug)]
struct ActiveFile {
    name: String,
    stamp: JournalStamp,
    offset: u64,
    assembler: LineAssembler,
}

/// The replay-then-tail ingestion source over one journal directory.
#[derive(Debug)]
pub struct JournalSource {
    dir: PathBuf,
    active: Option<ActiveFile>,
}

impl JournalSource {
    /// Create a source over the given journal directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            active: None,
        }
    }

    /// The directory being ingested.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// The name of the file currently being tailed, if any.
    pub fn active_file(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.name.as_str())
    }

    /// Forget all tailing state. The next [`Self::replay`] starts from
    /// scratch; used when the directory reappears after an outage.
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Replay every existing journal file in chronological order,
    /// delivering each parsed line to `sink`.
    ///
    /// The newest file's end-of-replay byte offset becomes the tail
    /// cursor; an unterminated trailing line of that file stays buffered
    /// until tailing completes it. Files that vanish between enumeration
    /// and reading are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] if the directory cannot be
    /// enumerated.
    pub fn replay(&mut self, mut sink: impl FnMut(JournalEvent)) -> Result<ReplayStats, SourceError> {
        self.active = None;
        let files = self.enumerate()?;
        let mut stats = ReplayStats::default();

        let count = files.len();
        for (index, (name, stamp)) in files.into_iter().enumerate() {
            let path = self.dir.join(&name);
            let contents = match std::fs::read(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!(file = %name, error = %err, "journal file vanished during replay");
                    continue;
                }
            };

            // Journal content is ASCII-dominant JSON; lossy decoding keeps
            // a stray invalid byte from aborting the whole file.
            let text = String::from_utf8_lossy(&contents);
            let mut assembler = LineAssembler::default();
            assembler.push(&text, |line| {
                deliver(line, &mut sink, &mut stats.lines, &mut stats.parse_failures);
            });

            let is_newest = index.saturating_add(1) == count;
            if is_newest {
                self.active = Some(ActiveFile {
                    name,
                    stamp,
                    offset: offset_of(contents.len()),
                    assembler,
                });
            } else {
                // Rotated files can never grow again: an unterminated
                // final line is complete as far as the game is concerned.
                assembler.flush(|line| {
                    deliver(line, &mut sink, &mut stats.lines, &mut stats.parse_failures);
                });
            }
            stats.files = stats.files.saturating_add(1);
        }

        Ok(stats)
    }

    /// Tail poll: deliver any bytes appended to the active file since the
    /// last poll, and switch to a newer part or session file when one has
    /// appeared (finishing the old file first, so ordering is preserved).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] if the directory cannot be
    /// enumerated.
    pub fn poll(&mut self, mut sink: impl FnMut(JournalEvent)) -> Result<PollStats, SourceError> {
        let files = self.enumerate()?;
        let mut stats = PollStats::default();

        let Some((newest_name, newest_stamp)) = files.last().cloned() else {
            return Ok(stats);
        };

        let switching = self
            .active
            .as_ref()
            .is_none_or(|active| active.name != newest_name);

        if switching {
            let previous_stamp = if let Some(mut active) = self.active.take() {
                // Drain whatever the old active file still holds, then
                // close it out: it will not be appended to again.
                self.drain_growth(&mut active, &mut sink, &mut stats);
                active.assembler.flush(|line| {
                    deliver(line, &mut sink, &mut stats.lines, &mut stats.parse_failures);
                });
                Some(active.stamp)
            } else {
                None
            };

            // Files that appeared between the old active file and the
            // newest one (several rotations within one poll window) are
            // read whole, in order.
            for (name, stamp) in &files {
                let after_previous = previous_stamp.is_none_or(|prev| *stamp > prev);
                if after_previous && *name != newest_name {
                    self.read_whole(name, &mut sink, &mut stats);
                }
            }

            self.active = Some(ActiveFile {
                name: newest_name,
                stamp: newest_stamp,
                offset: 0,
                assembler: LineAssembler::default(),
            });
            stats.rotated = true;
        }

        if let Some(mut active) = self.active.take() {
            self.drain_growth(&mut active, &mut sink, &mut stats);
            self.active = Some(active);
        }

        Ok(stats)
    }

    /// Enumerate matching journal files, chronologically ordered.
    fn enumerate(&self) -> Result<Vec<(String, JournalStamp)>, SourceError> {
        let entries = std::fs::read_dir(&self.dir)?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stamp) = parse_journal_name(&name) {
                files.push((name, stamp));
            }
        }
        files.sort_by_key(|(_, stamp)| *stamp);
        Ok(files)
    }

    /// Read bytes appended past the active file's cursor and deliver the
    /// completed lines. A shrunken file is treated as replaced and read
    /// again from the top. Read errors are transient: logged and retried
    /// on the next poll.
    fn drain_growth(
        &self,
        active: &mut ActiveFile,
        sink: &mut impl FnMut(JournalEvent),
        stats: &mut PollStats,
    ) {
        let path = self.dir.join(&active.name);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                trace!(file = %active.name, error = %err, "active journal unreadable");
                return;
            }
        };

        let len = match file.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                trace!(file = %active.name, error = %err, "active journal unreadable");
                return;
            }
        };

        if len < active.offset {
            warn!(file = %active.name, "active journal shrank, restarting from offset zero");
            active.offset = 0;
            active.assembler.clear();
        }
        if len == active.offset {
            return;
        }

        if let Err(err) = file.seek(SeekFrom::Start(active.offset)) {
            trace!(file = %active.name, error = %err, "seek failed");
            return;
        }

        let mut buffer = Vec::new();
        if let Err(err) = file.read_to_end(&mut buffer) {
            trace!(file = %active.name, error = %err, "read failed");
            return;
        }

        active.offset = active.offset.saturating_add(offset_of(buffer.len()));
        let text = String::from_utf8_lossy(&buffer);
        active.assembler.push(&text, |line| {
            deliver(line, sink, &mut stats.lines, &mut stats.parse_failures);
        });
    }

    /// Read a rotated-past file in full and deliver all of its lines.
    fn read_whole(
        &self,
        name: &str,
        sink: &mut impl FnMut(JournalEvent),
        stats: &mut PollStats,
    ) {
        let path = self.dir.join(name);
        let contents = match std::fs::read(&path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(file = %name, error = %err, "rotated journal vanished before it was read");
                return;
            }
        };

        let text = String::from_utf8_lossy(&contents);
        let mut assembler = LineAssembler::default();
        assembler.push(&text, |line| {
            deliver(line, sink, &mut stats.lines, &mut stats.parse_failures);
        });
        assembler.flush(|line| {
            deliver(line, sink, &mut stats.lines, &mut stats.parse_failures);
        });
    }
}

/// Parse one assembled line and hand it to the sink, counting the
/// outcome. Empty lines are neither delivered nor counted as failures.
fn deliver(
    raw: &str,
    sink: &mut impl FnMut(JournalEvent),
    lines: &mut u64,
    failures: &mut u64,
) {
    if raw.trim().is_empty() {
        return;
    }
    match parse_line(raw) {
        Some(event) => {
            *lines = lines.saturating_add(1);
            sink(event);
        }
        None => {
            *failures = failures.saturating_add(1);
        }
    }
}

/// Widen a buffer length to a byte offset.
fn offset_of(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write as _;
    use std::path::Path;

    use super::*;

    fn line(minute: u32, name: &str) -> String {
        format!(
            "{{\"timestamp\":\"2024-01-01T00:{minute:02}:00Z\",\"event\":\"{name}\"}}\n"
        )
    }

    fn append(dir: &Path, file: &str, contents: &str) {
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(file))
            .unwrap();
        handle.write_all(contents.as_bytes()).unwrap();
    }

    fn collect_names(source: &mut JournalSource) -> (Vec<String>, ReplayStats) {
        let mut seen = Vec::new();
        let stats = source.replay(|event| seen.push(event.name)).unwrap();
        (seen, stats)
    }

    #[test]
    fn replay_processes_files_chronologically() {
        let dir = tempfile::tempdir().unwrap();
        append(dir.path(), "Journal.2024-08-15T180000.02.log", &line(2, "Third"));
        append(dir.path(), "Journal.2024-08-14T120000.01.log", &line(0, "First"));
        append(dir.path(), "Journal.2024-08-15T180000.01.log", &line(1, "Second"));
        append(dir.path(), "Status.json", "{}");

        let mut source = JournalSource::new(dir.path());
        let (seen, stats) = collect_names(&mut source);

        assert_eq!(seen, vec!["First", "Second", "Third"]);
        assert_eq!(stats.files, 3);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.parse_failures, 0);
        assert_eq!(
            source.active_file(),
            Some("Journal.2024-08-15T180000.02.log")
        );
    }

    #[test]
    fn replay_then_tail_has_no_gap_and_no_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let file = "Journal.2024-08-15T180000.01.log";
        append(dir.path(), file, &line(0, "A"));
        append(dir.path(), file, &line(1, "B"));

        let mut source = JournalSource::new(dir.path());
        let (seen, _) = collect_names(&mut source);
        assert_eq!(seen, vec!["A", "B"]);

        // Nothing new: poll delivers nothing.
        let mut tail: Vec<String> = Vec::new();
        let stats = source.poll(|event| tail.push(event.name)).unwrap();
        assert!(tail.is_empty());
        assert_eq!(stats.lines, 0);

        // New append is delivered exactly once.
        append(dir.path(), file, &line(2, "C"));
        source.poll(|event| tail.push(event.name)).unwrap();
        source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["C"]);
    }

    #[test]
    fn partial_line_is_buffered_until_completed() {
        let dir = tempfile::tempdir().unwrap();
        let file = "Journal.2024-08-15T180000.01.log";
        append(dir.path(), file, &line(0, "A"));
        // A half-written line with no terminator.
        append(
            dir.path(),
            file,
            "{\"timestamp\":\"2024-01-01T00:01:00Z\",\"ev",
        );

        let mut source = JournalSource::new(dir.path());
        let (seen, stats) = collect_names(&mut source);
        assert_eq!(seen, vec!["A"]);
        assert_eq!(stats.parse_failures, 0);

        // The game finishes the line; only then is it delivered.
        let mut tail: Vec<String> = Vec::new();
        append(dir.path(), file, "ent\":\"B\"}\n");
        source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["B"]);
    }

    #[test]
    fn rotation_to_a_new_part_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        let part1 = "Journal.2024-08-15T180000.01.log";
        let part2 = "Journal.2024-08-15T180000.02.log";
        append(dir.path(), part1, &line(0, "A"));

        let mut source = JournalSource::new(dir.path());
        let (seen, _) = collect_names(&mut source);
        assert_eq!(seen, vec!["A"]);

        // The game writes a final line to part 1 and opens part 2.
        append(dir.path(), part1, &line(1, "B"));
        append(dir.path(), part2, &line(2, "C"));

        let mut tail: Vec<String> = Vec::new();
        let stats = source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["B", "C"]);
        assert!(stats.rotated);
        assert_eq!(source.active_file(), Some(part2));
    }

    #[test]
    fn multiple_rotations_within_one_poll_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        append(dir.path(), "Journal.2024-08-15T180000.01.log", &line(0, "A"));

        let mut source = JournalSource::new(dir.path());
        let (seen, _) = collect_names(&mut source);
        assert_eq!(seen, vec!["A"]);

        append(dir.path(), "Journal.2024-08-15T180000.02.log", &line(1, "B"));
        append(dir.path(), "Journal.2024-08-15T190000.01.log", &line(2, "C"));

        let mut tail: Vec<String> = Vec::new();
        source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["B", "C"]);
        assert_eq!(
            source.active_file(),
            Some("Journal.2024-08-15T190000.01.log")
        );
    }

    #[test]
    fn truncated_active_file_restarts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = "Journal.2024-08-15T180000.01.log";
        append(dir.path(), file, &line(0, "A"));

        let mut source = JournalSource::new(dir.path());
        let (seen, _) = collect_names(&mut source);
        assert_eq!(seen, vec!["A"]);

        // Replace the file with shorter content.
        std::fs::write(dir.path().join(file), line(1, "B")).unwrap();

        let mut tail: Vec<String> = Vec::new();
        source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["B"]);
    }

    #[test]
    fn malformed_lines_are_dropped_without_stopping_ingestion() {
        let dir = tempfile::tempdir().unwrap();
        let file = "Journal.2024-08-15T180000.01.log";
        append(dir.path(), file, &line(0, "A"));
        append(dir.path(), file, "this is not json\n");
        append(dir.path(), file, &line(1, "B"));

        let mut source = JournalSource::new(dir.path());
        let (seen, stats) = collect_names(&mut source);
        assert_eq!(seen, vec!["A", "B"]);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.parse_failures, 1);
    }

    #[test]
    fn missing_directory_reports_unavailable() {
        let mut source = JournalSource::new("/definitely/not/a/real/path");
        let result = source.replay(|_| {});
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));

        let result = source.poll(|_| {});
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn file_created_after_empty_start_is_tailed_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = JournalSource::new(dir.path());
        let (seen, stats) = collect_names(&mut source);
        assert!(seen.is_empty());
        assert_eq!(stats.files, 0);

        append(dir.path(), "Journal.2024-08-15T180000.01.log", &line(0, "A"));

        let mut tail: Vec<String> = Vec::new();
        let stats = source.poll(|event| tail.push(event.name)).unwrap();
        assert_eq!(tail, vec!["A"]);
        assert!(stats.rotated);
    }

    #[test]
    fn empty_lines_are_ignored_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let file = "Journal.2024-08-15T180000.01.log";
        append(dir.path(), file, "\n\n");
        append(dir.path(), file, &line(0, "A"));
        append(dir.path(), file, "   \n");

        let mut source = JournalSource::new(dir.path());
        let (seen, stats) = collect_names(&mut source);
        assert_eq!(seen, vec!["A"]);
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.parse_failures, 0);
    }
}
