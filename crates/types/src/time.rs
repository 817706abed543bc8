// crates/types/src/time.rs
//! Timestamp and id helpers shared by every job record.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with millisecond precision, e.g.
/// `2026-10-18T12:00:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generates job ids from the wall clock in milliseconds.
///
/// Ids are strictly increasing per generator: two jobs created in the same
/// millisecond get consecutive values instead of colliding.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last = if now > self.last { now } else { self.last + 1 };
        self.last.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_iso_has_millis_and_zulu() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        // 2026-10-18T12:00:00.000Z
        assert_eq!(ts.len(), 24);
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_id_generator_is_strictly_increasing() {
        let mut ids = IdGenerator::new();
        let a: i64 = ids.next_id().parse().unwrap();
        let b: i64 = ids.next_id().parse().unwrap();
        let c: i64 = ids.next_id().parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
