//! Clinic session types
//!
//! Hospitals split each clinic day into three sessions. Sites label them in
//! Chinese (上午 / 下午 / 晚上), queue endpoints address them by period code
//! (1 / 2 / 3), and the store persists the Chinese label.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three daily clinic sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionType {
    /// 上午
    #[serde(rename = "上午")]
    Morning,
    /// 下午
    #[serde(rename = "下午")]
    Afternoon,
    /// 晚上
    #[serde(rename = "晚上")]
    Evening,
}

impl SessionType {
    /// All sessions in chronological order
    pub const ALL: [SessionType; 3] = [
        SessionType::Morning,
        SessionType::Afternoon,
        SessionType::Evening,
    ];

    /// Label as stored and displayed
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Morning => "上午",
            SessionType::Afternoon => "下午",
            SessionType::Evening => "晚上",
        }
    }

    /// Period code used by queue-progress endpoints
    pub fn period_code(&self) -> &'static str {
        match self {
            SessionType::Morning => "1",
            SessionType::Afternoon => "2",
            SessionType::Evening => "3",
        }
    }

    /// Reverse of [`SessionType::period_code`]
    pub fn from_period_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(SessionType::Morning),
            "2" => Some(SessionType::Afternoon),
            "3" => Some(SessionType::Evening),
            _ => None,
        }
    }

    /// Recognise a session from free text scraped off a schedule grid.
    ///
    /// Matching is by substring, so `"上午診"` and `"AM Clinic"` both resolve.
    pub fn from_label(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if text.contains("上午") || lower.contains("morning") || text.contains("AM") {
            return Some(SessionType::Morning);
        }
        if text.contains("下午") || lower.contains("afternoon") || text.contains("PM") {
            return Some(SessionType::Afternoon);
        }
        if text.contains("晚上")
            || text.contains("夜診")
            || lower.contains("evening")
            || lower.contains("night")
        {
            return Some(SessionType::Evening);
        }
        None
    }

    /// Nominal clinic start time
    pub fn start_time(&self) -> NaiveTime {
        let (h, m) = match self {
            SessionType::Morning => (8, 30),
            SessionType::Afternoon => (13, 30),
            SessionType::Evening => (18, 0),
        };
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Average consultation length used for arrival estimates
    pub fn minutes_per_patient(&self) -> i64 {
        match self {
            SessionType::Evening => 3,
            SessionType::Morning | SessionType::Afternoon => 5,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "上午" | "morning" | "am" | "1" => Ok(SessionType::Morning),
            "下午" | "afternoon" | "pm" | "2" => Ok(SessionType::Afternoon),
            "晚上" | "evening" | "night" | "3" => Ok(SessionType::Evening),
            _ => Err(format!("Unknown session type: {s}")),
        }
    }
}
