//! Wall-clock access in hospital local time
//!
//! Every site tracked here runs on Taiwan time (UTC+8, no daylight saving).
//! Date comparisons such as "is this session today" must use that offset,
//! never the host's zone.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

const TAIWAN_OFFSET_SECONDS: i32 = 8 * 3600;

/// Taiwan's fixed UTC offset
pub fn taiwan_offset() -> FixedOffset {
    match FixedOffset::east_opt(TAIWAN_OFFSET_SECONDS) {
        Some(offset) => offset,
        None => Utc.fix(),
    }
}

/// Source of "now", injectable for tests
pub trait Clock: Send + Sync {
    /// Current instant in Taiwan local time
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current calendar date in Taiwan local time
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&taiwan_offset())
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    /// Freeze at the given instant
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }

    /// Freeze at a Taiwan local date and time
    pub fn at_local(date: NaiveDate, hour: u32, minute: u32) -> Option<Self> {
        date.and_hms_opt(hour, minute, 0)?
            .and_local_timezone(taiwan_offset())
            .single()
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
