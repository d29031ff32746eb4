//! Journal filename recognition and chronological ordering.
//!
//! Journal logs are named `Journal.<YYYY-MM-DDTHHmmss>.<NN>.log`: a
//! compact, colon-free date-time of the session start followed by a
//! two-digit zero-padded part number that increments each time the game
//! rotates to a new file within the same session. Ordering by
//! `(date, part)` is therefore the true write order, independent of
//! file-system timestamps.

use std::cmp::Reverse;

use chrono::NaiveDateTime;

/// Filename prefix of every journal log.
const JOURNAL_PREFIX: &str = "Journal.";

/// Filename suffix of every journal log.
const JOURNAL_SUFFIX: &str = ".log";

/// Format of the compact date-time embedded in journal filenames.
const STAMP_FORMAT: &str = "%Y-%m-%dT%H%M%S";

/// The parsed identity of one journal log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JournalStamp {
    /// Session start time embedded in the filename.
    pub started: NaiveDateTime,
    /// Part number within the session (01, 02, ...).
    pub part: u8,
}

/// Parse a journal log filename into its stamp.
///
/// Returns `None` for any name that does not match the pattern exactly:
/// wrong prefix or suffix, a part that is not two ASCII digits, or a
/// date-time that does not parse.
pub fn parse_journal_name(name: &str) -> Option<JournalStamp> {
    let rest = name.strip_prefix(JOURNAL_PREFIX)?;
    let rest = rest.strip_suffix(JOURNAL_SUFFIX)?;
    let (stamp, part) = rest.rsplit_once('.')?;

    if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let part: u8 = part.parse().ok()?;

    let started = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some(JournalStamp { started, part })
}

/// Sort filenames newest-first: `(date desc, part desc)`.
///
/// Non-matching names sink to the end in their original relative order
/// (the sort is stable).
pub fn sort_newest_first(names: &mut [String]) {
    names.sort_by_key(|name| match parse_journal_name(name) {
        Some(stamp) => (false, Some((Reverse(stamp.started), Reverse(stamp.part)))),
        None => (true, None),
    });
}

/// Return the matching filenames in chronological (replay) order:
/// oldest session first, parts ascending within a session.
///
/// Non-matching names are dropped.
pub fn chronological(names: &[String]) -> Vec<String> {
    let mut matching: Vec<(JournalStamp, String)> = names
        .iter()
        .filter_map(|name| parse_journal_name(name).map(|stamp| (stamp, name.clone())))
        .collect();
    matching.sort_by_key(|(stamp, _)| *stamp);
    matching.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_name() {
        let stamp = parse_journal_name("Journal.2024-08-15T180000.02.log").unwrap();
        assert_eq!(stamp.part, 2);
        assert_eq!(
            stamp.started,
            NaiveDateTime::parse_from_str("2024-08-15T180000", STAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn rejects_near_misses() {
        // Wrong prefix.
        assert!(parse_journal_name("Log.2024-08-15T180000.01.log").is_none());
        // Wrong suffix.
        assert!(parse_journal_name("Journal.2024-08-15T180000.01.txt").is_none());
        // One-digit part.
        assert!(parse_journal_name("Journal.2024-08-15T180000.1.log").is_none());
        // Three-digit part.
        assert!(parse_journal_name("Journal.2024-08-15T180000.001.log").is_none());
        // Colons in the date-time.
        assert!(parse_journal_name("Journal.2024-08-15T18:00:00.01.log").is_none());
        // Impossible date.
        assert!(parse_journal_name("Journal.2024-13-40T180000.01.log").is_none());
        // Missing part entirely.
        assert!(parse_journal_name("Journal.2024-08-15T180000.log").is_none());
    }

    #[test]
    fn newest_first_ordering() {
        let mut names = vec![
            "Journal.2024-08-15T180000.02.log".to_owned(),
            "Journal.2024-08-15T180000.01.log".to_owned(),
            "Journal.2024-08-14T120000.01.log".to_owned(),
        ];
        sort_newest_first(&mut names);
        assert_eq!(
            names,
            vec![
                "Journal.2024-08-15T180000.02.log".to_owned(),
                "Journal.2024-08-15T180000.01.log".to_owned(),
                "Journal.2024-08-14T120000.01.log".to_owned(),
            ]
        );
    }

    #[test]
    fn non_matching_names_sink_in_original_order() {
        let mut names = vec![
            "Status.json".to_owned(),
            "Journal.2024-08-14T120000.01.log".to_owned(),
            "notes.txt".to_owned(),
            "Journal.2024-08-15T180000.01.log".to_owned(),
        ];
        sort_newest_first(&mut names);
        assert_eq!(
            names,
            vec![
                "Journal.2024-08-15T180000.01.log".to_owned(),
                "Journal.2024-08-14T120000.01.log".to_owned(),
                "Status.json".to_owned(),
                "notes.txt".to_owned(),
            ]
        );
    }

    #[test]
    fn chronological_is_the_replay_order() {
        let names = vec![
            "Journal.2024-08-15T180000.02.log".to_owned(),
            "Status.json".to_owned(),
            "Journal.2024-08-15T180000.01.log".to_owned(),
            "Journal.2024-08-14T120000.01.log".to_owned(),
        ];
        assert_eq!(
            chronological(&names),
            vec![
                "Journal.2024-08-14T120000.01.log".to_owned(),
                "Journal.2024-08-15T180000.01.log".to_owned(),
                "Journal.2024-08-15T180000.02.log".to_owned(),
            ]
        );
    }

    #[test]
    fn part_breaks_ties_within_a_session() {
        let a = parse_journal_name("Journal.2024-08-15T180000.01.log").unwrap();
        let b = parse_journal_name("Journal.2024-08-15T180000.02.log").unwrap();
        assert!(b > a);
    }
}
