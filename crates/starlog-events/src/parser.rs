//! The infallible journal line parser.
//!
//! The engine must tolerate malformed and unknown input forever: the game
//! is an external process and its journal format evolves. [`parse_line`]
//! therefore never returns an error and never panics -- anything that is
//! not a well-formed journal line yields `None` and is dropped by the
//! caller without aborting ingestion of subsequent lines.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::event::JournalEvent;
use crate::kind::EventKind;

/// Parse one raw journal line into a [`JournalEvent`].
///
/// Returns `None` for:
/// - empty or whitespace-only input
/// - invalid JSON, or JSON that is not an object
/// - a missing or non-string `timestamp` or `event` field
/// - an empty `event` name
/// - a `timestamp` that is not valid RFC 3339
///
/// All other payload fields pass through untyped in the payload map.
pub fn parse_line(raw: &str) -> Option<JournalEvent> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(trimmed) else {
        return None;
    };

    let timestamp = payload
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)?;

    let name = payload.get("event").and_then(Value::as_str)?;
    if name.is_empty() {
        return None;
    }
    let name = name.to_owned();
    let kind = EventKind::from_name(&name);

    Some(JournalEvent {
        timestamp,
        name,
        kind,
        payload,
    })
}

/// Parse an RFC 3339 timestamp string into UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|fixed| fixed.with_timezone(&Utc))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_a_minimal_valid_line() {
        let ev = parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDJump"}"#).unwrap();
        assert_eq!(ev.kind, EventKind::FsdJump);
        assert_eq!(ev.name, "FSDJump");
        assert_eq!(
            ev.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn unknown_event_name_still_parses() {
        let ev =
            parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","event":"BrandNewThing","X":1}"#)
                .unwrap();
        assert_eq!(ev.kind, EventKind::Unknown);
        assert_eq!(ev.name, "BrandNewThing");
        assert_eq!(ev.u64_field("X"), Some(1));
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \t  ").is_none());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_line("{not json").is_none());
        assert!(parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","event":"#).is_none());
    }

    #[test]
    fn rejects_non_object_json() {
        assert!(parse_line("42").is_none());
        assert!(parse_line(r#"["timestamp","event"]"#).is_none());
        assert!(parse_line("null").is_none());
    }

    #[test]
    fn rejects_missing_or_mistyped_required_fields() {
        // No timestamp.
        assert!(parse_line(r#"{"event":"FSDJump"}"#).is_none());
        // No event name.
        assert!(parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z"}"#).is_none());
        // Numeric timestamp.
        assert!(parse_line(r#"{"timestamp":1704067200,"event":"FSDJump"}"#).is_none());
        // Numeric event name.
        assert!(parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","event":7}"#).is_none());
        // Empty event name.
        assert!(parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","event":""}"#).is_none());
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        assert!(parse_line(r#"{"timestamp":"yesterday","event":"FSDJump"}"#).is_none());
        assert!(parse_line(r#"{"timestamp":"2024-13-45T99:99:99Z","event":"FSDJump"}"#).is_none());
    }

    #[test]
    fn offset_timestamps_normalize_to_utc() {
        let ev =
            parse_line(r#"{"timestamp":"2024-01-01T02:00:00+02:00","event":"FSDJump"}"#).unwrap();
        assert_eq!(
            ev.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
