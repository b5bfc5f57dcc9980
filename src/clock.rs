//! Timestamps and time sources
//!
//! Board timestamps are ISO-8601 (RFC 3339) strings on the wire. The system
//! clock truncates to milliseconds so values match browser-written data.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// A UTC instant, serialized as an RFC 3339 string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// Unix epoch, mostly useful as a test anchor
    pub const EPOCH: Timestamp = Timestamp(OffsetDateTime::UNIX_EPOCH);

    pub fn from_datetime(dt: OffsetDateTime) -> Self {
        Self(dt.to_offset(time::UtcOffset::UTC))
    }

    /// Parse any RFC 3339 timestamp (e.g. `2024-05-01T09:30:00.000Z`)
    pub fn parse(s: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(s, &Rfc3339).map(Self::from_datetime)
    }

    pub fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Milliseconds since the unix epoch
    pub fn unix_millis(&self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    /// Same instant with sub-millisecond precision dropped
    pub fn truncate_to_millis(self) -> Self {
        let nanos = u32::from(self.0.millisecond()) * 1_000_000;
        Self(self.0.replace_nanosecond(nanos).unwrap_or(self.0))
    }

    pub fn checked_add(self, step: Duration) -> Option<Self> {
        self.0.checked_add(step).map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

/// Source of "now" for the store and storage adapter
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock (millisecond precision)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(OffsetDateTime::now_utc()).truncate_to_millis()
    }
}

/// Deterministic clock: returns `start`, then advances by `step` on every call
#[derive(Debug)]
pub struct SteppingClock {
    next: Cell<Timestamp>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: Duration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }

    /// Starts at the unix epoch and ticks one millisecond per call
    pub fn millis() -> Self {
        Self::new(Timestamp::EPOCH, Duration::milliseconds(1))
    }

    /// Value the next call to `now` will return
    pub fn peek(&self) -> Timestamp {
        self.next.get()
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let current = self.next.get();
        // Saturate at the far end of the representable range
        self.next.set(current.checked_add(self.step).unwrap_or(current));
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_browser_iso_string() {
        let ts = Timestamp::parse("2024-05-01T09:30:00.250Z").unwrap();
        assert_eq!(ts.unix_millis(), 1_714_555_800_250);
        assert_eq!(ts.to_string(), "2024-05-01T09:30:00.25Z");
    }

    #[test]
    fn test_parse_with_offset_normalizes_to_utc() {
        let a = Timestamp::parse("2024-05-01T11:30:00+02:00").unwrap();
        let b = Timestamp::parse("2024-05-01T09:30:00Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_as_string() {
        let ts = Timestamp::parse("2024-05-01T09:30:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-05-01T09:30:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_system_clock_drops_sub_millis() {
        let now = SystemClock.now();
        assert_eq!(now.as_datetime().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_stepping_clock_is_strictly_increasing() {
        let clock = SteppingClock::millis();
        let a = clock.now();
        let b = clock.now();
        let c = clock.now();
        assert!(a < b && b < c);
        assert_eq!(c.unix_millis() - a.unix_millis(), 2);
        assert_eq!(clock.peek().unix_millis(), 3);
    }
}
