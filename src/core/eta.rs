//! Arrival time estimates
//!
//! Turns a queue position into a wall-clock estimate using the nominal
//! session start and a fixed per-patient pace.

use crate::domain::SessionType;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use std::fmt;

/// Result of an arrival estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtaOutcome {
    /// The session date is in the past
    Ended,
    /// The target ticket has already been called
    Passed,
    /// Estimated local clock time
    At(NaiveTime),
}

impl fmt::Display for EtaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtaOutcome::Ended => f.write_str("已結束"),
            EtaOutcome::Passed => f.write_str("已過號"),
            EtaOutcome::At(time) => write!(f, "{}", time.format("%H:%M")),
        }
    }
}

/// Estimate when `target` (or, without a target, the last registered
/// patient) will be seen.
///
/// `now` must be in hospital local time.
///
/// # Example
///
/// ```rust
/// use queuewatch::core::eta::estimate_eta;
/// use queuewatch::domain::{FixedClock, Clock, SessionType};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let now = FixedClock::at_local(date, 9, 0).unwrap().now();
///
/// let eta = estimate_eta(date, SessionType::Morning, Some(6), None, &[], Some(20), now);
/// assert_eq!(eta.to_string(), "10:10");
/// ```
pub fn estimate_eta(
    session_date: NaiveDate,
    session_type: SessionType,
    current: Option<i32>,
    registered: Option<i32>,
    waiting_list: &[i32],
    target: Option<i32>,
    now: DateTime<FixedOffset>,
) -> EtaOutcome {
    let today = now.date_naive();
    if session_date < today {
        return EtaOutcome::Ended;
    }

    let ahead = match target {
        Some(target) => {
            if let Some(current) = current {
                if current > target && !waiting_list.contains(&target) {
                    return EtaOutcome::Passed;
                }
            }

            if !waiting_list.is_empty() {
                waiting_list.iter().filter(|n| **n < target).count() as i64
            } else if let Some(current) = current {
                i64::from((target - current).max(0))
            } else {
                i64::from((target - 1).max(0))
            }
        }
        None => {
            let waiting = waiting_list.len() as i64;
            (i64::from(registered.unwrap_or(0)) - waiting).max(0)
        }
    };

    let start = session_type.start_time();
    let baseline = if session_date > today {
        start
    } else {
        now.time().max(start)
    };

    let eta = baseline + Duration::minutes(ahead * session_type.minutes_per_patient());
    EtaOutcome::At(eta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Clock, FixedClock};
    use test_case::test_case;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedClock::at_local(day(), hour, minute).unwrap().now()
    }

    #[test]
    fn test_started_clinic_uses_now() {
        // 14 ahead at 09:00, 5 minutes each
        let eta = estimate_eta(
            day(),
            SessionType::Morning,
            Some(6),
            None,
            &[],
            Some(20),
            at(9, 0),
        );
        assert_eq!(eta.to_string(), "10:10");
    }

    #[test]
    fn test_past_session_has_ended() {
        let yesterday = day().pred_opt().unwrap();
        let eta = estimate_eta(
            yesterday,
            SessionType::Afternoon,
            Some(1),
            Some(50),
            &[2, 3],
            Some(30),
            at(9, 0),
        );
        assert_eq!(eta, EtaOutcome::Ended);
        assert_eq!(eta.to_string(), "已結束");
    }

    #[test]
    fn test_before_start_uses_session_start() {
        // Unknown current number: everyone from 1 to 21 is ahead
        let eta = estimate_eta(
            day(),
            SessionType::Afternoon,
            None,
            None,
            &[],
            Some(22),
            at(12, 0),
        );
        assert_eq!(eta.to_string(), "15:15");
    }

    #[test]
    fn test_doctor_pace_without_target() {
        let waiting: Vec<i32> = (31..=40).collect();
        let eta = estimate_eta(
            day(),
            SessionType::Evening,
            Some(30),
            Some(40),
            &waiting,
            None,
            at(17, 0),
        );
        assert_eq!(eta.to_string(), "19:30");
    }

    #[test]
    fn test_waiting_list_counts_below_target() {
        let waiting: Vec<i32> = (20..=70).collect();
        let eta = estimate_eta(
            day(),
            SessionType::Morning,
            Some(19),
            None,
            &waiting,
            Some(48),
            at(10, 0),
        );
        assert_eq!(eta.to_string(), "12:20");
    }

    #[test]
    fn test_current_known_before_start() {
        let eta = estimate_eta(
            day(),
            SessionType::Afternoon,
            Some(5),
            None,
            &[],
            Some(10),
            at(13, 0),
        );
        assert_eq!(eta.to_string(), "13:55");
    }

    #[test]
    fn test_skipped_target_still_waiting_is_not_passed() {
        let eta = estimate_eta(
            day(),
            SessionType::Afternoon,
            Some(12),
            None,
            &[3, 4, 5, 6, 7, 10],
            Some(10),
            at(14, 0),
        );
        assert_eq!(eta.to_string(), "14:25");
    }

    #[test]
    fn test_target_passed() {
        let eta = estimate_eta(
            day(),
            SessionType::Afternoon,
            Some(12),
            None,
            &[13, 14],
            Some(10),
            at(14, 0),
        );
        assert_eq!(eta, EtaOutcome::Passed);
        assert_eq!(eta.to_string(), "已過號");
    }

    #[test_case(SessionType::Morning, "08:30"; "morning")]
    #[test_case(SessionType::Afternoon, "13:30"; "afternoon")]
    #[test_case(SessionType::Evening, "18:00"; "evening")]
    fn test_future_session_starts_at_nominal_time(session: SessionType, expected: &str) {
        let tomorrow = day().succ_opt().unwrap();
        let eta = estimate_eta(tomorrow, session, None, Some(0), &[], None, at(20, 0));
        assert_eq!(eta.to_string(), expected);
    }
}
