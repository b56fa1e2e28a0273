//! Live-fetch time gate

use crate::domain::SessionType;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

/// Decides whether a session is running right now and worth a live fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveFetchGate {
    active_window: Duration,
}

impl LiveFetchGate {
    /// Gate keeping each session open for `active_window_hours` after its start
    pub fn new(active_window_hours: u32) -> Self {
        Self {
            active_window: Duration::hours(i64::from(active_window_hours)),
        }
    }

    /// Due when the session is today, has started, and is still inside the window.
    ///
    /// `now` must be in hospital local time.
    pub fn is_due(
        &self,
        session_date: NaiveDate,
        session_type: SessionType,
        now: DateTime<FixedOffset>,
    ) -> bool {
        let now = now.naive_local();
        if session_date != now.date() {
            return false;
        }
        let start = session_date.and_time(session_type.start_time());
        start <= now && now < start + self.active_window
    }
}

impl Default for LiveFetchGate {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Clock, FixedClock};
    use test_case::test_case;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test_case(8, 0, false; "before start")]
    #[test_case(8, 30, true; "at start")]
    #[test_case(11, 0, true; "inside window")]
    #[test_case(12, 29, true; "last minute of window")]
    #[test_case(12, 30, false; "window closed")]
    fn test_morning_gate(hour: u32, minute: u32, expected: bool) {
        let now = FixedClock::at_local(day(), hour, minute).unwrap().now();
        assert_eq!(
            LiveFetchGate::default().is_due(day(), SessionType::Morning, now),
            expected
        );
    }

    #[test]
    fn test_other_days_never_due() {
        let now = FixedClock::at_local(day(), 9, 0).unwrap().now();
        let gate = LiveFetchGate::default();
        assert!(!gate.is_due(day().succ_opt().unwrap(), SessionType::Morning, now));
        assert!(!gate.is_due(day().pred_opt().unwrap(), SessionType::Morning, now));
    }

    #[test]
    fn test_window_is_configurable() {
        let now = FixedClock::at_local(day(), 19, 30).unwrap().now();
        assert!(!LiveFetchGate::new(1).is_due(day(), SessionType::Evening, now));
        assert!(LiveFetchGate::new(2).is_due(day(), SessionType::Evening, now));
    }
}
