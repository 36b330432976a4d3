//! The protocol day clock
//!
//! Every piece of protocol state is keyed by an `EpochDay`: the number of
//! whole days since the unix epoch, `floor(unix_seconds / 86400)`, in UTC by
//! construction. Day N ends the instant day N+1 begins; there are no
//! timezone or DST boundaries anywhere in the protocol.

use crate::types::constants::SECONDS_PER_DAY;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single protocol day, identified by its index since the unix epoch
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpochDay(u64);

impl EpochDay {
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    /// Day containing the given unix timestamp
    pub const fn from_unix_seconds(secs: u64) -> Self {
        Self(secs / SECONDS_PER_DAY)
    }

    /// The current day
    pub fn today() -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self::from_unix_seconds(now)
    }

    pub const fn index(self) -> u64 {
        self.0
    }

    /// The day before, saturating at day zero
    pub const fn prev(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Unix timestamp of the first second of this day
    pub const fn start_unix_seconds(self) -> u64 {
        self.0 * SECONDS_PER_DAY
    }

    /// Calendar date of this day, for display. `None` only for day indexes
    /// far beyond chrono's representable range.
    pub fn date(self) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp(self.start_unix_seconds() as i64, 0)
            .map(|dt| dt.date_naive())
    }
}

impl fmt::Debug for EpochDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpochDay({})", self.0)
    }
}

impl fmt::Display for EpochDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EpochDay {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_from_unix_seconds() {
        assert_eq!(EpochDay::from_unix_seconds(0), EpochDay::new(0));
        assert_eq!(EpochDay::from_unix_seconds(86_399), EpochDay::new(0));
        assert_eq!(EpochDay::from_unix_seconds(86_400), EpochDay::new(1));
        // 2026-01-01T00:00:00Z
        assert_eq!(EpochDay::from_unix_seconds(1_767_225_600), EpochDay::new(20_454));
    }

    #[test]
    fn test_day_boundaries() {
        let day = EpochDay::new(20_000);
        assert_eq!(day.start_unix_seconds(), 20_000 * 86_400);
        assert_eq!(EpochDay::from_unix_seconds(day.start_unix_seconds() - 1), day.prev());
        assert_eq!(day.prev().next(), day);
    }

    #[test]
    fn test_prev_saturates_at_zero() {
        assert_eq!(EpochDay::new(0).prev(), EpochDay::new(0));
    }

    #[test]
    fn test_display_is_bare_index() {
        assert_eq!(EpochDay::new(20_454).to_string(), "20454");
        assert_eq!(format!("{:?}", EpochDay::new(7)), "EpochDay(7)");
    }

    #[test]
    fn test_date() {
        let date = EpochDay::new(20_454).date().unwrap();
        assert_eq!(date.to_string(), "2026-01-01");
    }

    #[test]
    fn test_ordering() {
        assert!(EpochDay::new(5) < EpochDay::new(6));
        assert!(EpochDay::new(6) <= EpochDay::new(6));
    }
}
