//! Typed records produced by hospital adapters
//!
//! Adapters parse raw HTML into these structures; nothing downstream of an
//! adapter ever sees untyped scraped text.

use crate::domain::session::SessionType;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A department as listed on a hospital's appointment site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    /// Hospital code, e.g. `CMUH`
    pub hospital_code: String,
    /// Site-specific department code, stable per hospital
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional grouping, e.g. 內科系
    pub category: Option<String>,
    /// Display order within the hospital
    pub sort_order: i32,
}

impl DepartmentRecord {
    /// Create a department record with no category and sort order 0
    pub fn new(
        hospital_code: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            hospital_code: hospital_code.into(),
            code: code.into(),
            name: name.into(),
            category: None,
            sort_order: 0,
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the sort order
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// One doctor's clinic session as seen on a schedule page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSlot {
    /// Site-specific doctor number
    pub doctor_no: String,
    /// Display name with any parenthesised suffix removed
    pub doctor_name: String,
    /// Clinic type split out of the raw name, e.g. 教學診
    pub specialty: Option<String>,
    /// Department code the slot was found under
    pub department_code: String,
    /// Calendar date of the session
    pub session_date: NaiveDate,
    /// Session of the day
    pub session_type: SessionType,
    /// Maximum patients accepted, when the site shows it
    pub total_quota: Option<i32>,
    /// Patients registered so far
    pub registered: Option<i32>,
    /// Clinic room label; empty when unknown
    pub clinic_room: String,
    /// Live current-call number, filled only by a progress fetch
    pub current_number: Option<i32>,
    /// Registration closed because the slot is full
    pub is_full: bool,
    /// Free-text status
    pub status: Option<String>,
}

impl DoctorSlot {
    /// Build a slot from a raw scraped doctor name, splitting off any suffix
    pub fn new(
        doctor_no: impl Into<String>,
        raw_doctor_name: &str,
        department_code: impl Into<String>,
        session_date: NaiveDate,
        session_type: SessionType,
    ) -> Self {
        let (doctor_name, specialty) = split_doctor_name(raw_doctor_name);
        Self {
            doctor_no: doctor_no.into(),
            doctor_name,
            specialty,
            department_code: department_code.into(),
            session_date,
            session_type,
            total_quota: None,
            registered: None,
            clinic_room: String::new(),
            current_number: None,
            is_full: false,
            status: None,
        }
    }
}

/// Doctor identity as upserted into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorProfile {
    /// Site-specific doctor number
    pub doctor_no: String,
    /// Cleaned display name
    pub name: String,
    /// Clinic type suffix, if any
    pub specialty: Option<String>,
}

impl From<&DoctorSlot> for DoctorProfile {
    fn from(slot: &DoctorSlot) -> Self {
        Self {
            doctor_no: slot.doctor_no.clone(),
            name: slot.doctor_name.clone(),
            specialty: slot.specialty.clone(),
        }
    }
}

/// One row of a live queue display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Ticket number
    pub number: i32,
    /// Status label, e.g. 未看診 / 看診中 / 已看診 / 完成
    pub status: String,
}

/// Coarse clinic state announced on a queue page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicState {
    /// 已停診
    Suspended,
    /// 未開診
    NotStarted,
    /// 看診完畢
    Finished,
}

impl ClinicState {
    /// Detect the state from page text. Suspension wins over the others.
    pub fn detect(page_text: &str) -> Option<Self> {
        if page_text.contains("已停診") {
            Some(ClinicState::Suspended)
        } else if page_text.contains("未開診") || page_text.contains("尚未開始看診") {
            Some(ClinicState::NotStarted)
        } else if page_text.contains("看診完畢") || page_text.contains("已結束看診") {
            Some(ClinicState::Finished)
        } else {
            None
        }
    }

    /// Canonical label stored in snapshots
    pub fn label(&self) -> &'static str {
        match self {
            ClinicState::Suspended => "已停診",
            ClinicState::NotStarted => "未開診",
            ClinicState::Finished => "看診完畢",
        }
    }
}

/// Live queue state of one clinic room for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicProgress {
    /// Room the progress belongs to
    pub clinic_room: String,
    /// Session of the day
    pub session_type: SessionType,
    /// Ticket currently being served; 0 when only a status is known
    pub current_number: i32,
    /// Live quota, may differ from the schedule page
    pub total_quota: Option<i32>,
    /// Live registered count
    pub registered: Option<i32>,
    /// Coarse state label
    pub status: Option<String>,
    /// Tickets not yet served, in page order
    pub waiting_list: Option<Vec<i32>>,
    /// Every ticket row with its status
    pub queue_details: Option<Vec<QueueEntry>>,
}

impl ClinicProgress {
    /// Progress carrying only a current-call number
    pub fn current_only(
        clinic_room: impl Into<String>,
        session_type: SessionType,
        current_number: i32,
    ) -> Self {
        Self {
            clinic_room: clinic_room.into(),
            session_type,
            current_number,
            total_quota: None,
            registered: None,
            status: None,
            waiting_list: None,
            queue_details: None,
        }
    }
}

fn doctor_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(.+?)\((.+?)\)\s*$").ok())
        .as_ref()
}

/// Split `王小明(教學診)` into `("王小明", Some("教學診"))`.
///
/// The suffix names the clinic type of that schedule slot and is not part of
/// the doctor's name. Strings without a well-formed suffix come back trimmed.
pub fn split_doctor_name(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim();
    if let Some(caps) = doctor_name_pattern().and_then(|re| re.captures(trimmed)) {
        return (caps[1].trim().to_string(), Some(caps[2].trim().to_string()));
    }
    (trimmed.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("王大明", "王大明", None; "plain name")]
    #[test_case("陳小美(家庭醫學科)", "陳小美", Some("家庭醫學科"); "with specialty")]
    #[test_case("  李四(骨科)  ", "李四", Some("骨科"); "surrounding whitespace")]
    #[test_case("王小明(教學診)", "王小明", Some("教學診"); "clinic type")]
    #[test_case("()", "()", None; "empty parens")]
    #[test_case("(abc)", "(abc)", None; "no name before parens")]
    #[test_case("", "", None; "empty")]
    fn test_split_doctor_name(raw: &str, name: &str, specialty: Option<&str>) {
        let (got_name, got_specialty) = split_doctor_name(raw);
        assert_eq!(got_name, name);
        assert_eq!(got_specialty.as_deref(), specialty);
    }

    #[test]
    fn test_slot_new_splits_name() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 23).unwrap();
        let slot = DoctorSlot::new("1234", "王小明(教學診)", "DEP1", date, SessionType::Morning);
        assert_eq!(slot.doctor_name, "王小明");
        assert_eq!(slot.specialty.as_deref(), Some("教學診"));
        assert!(slot.current_number.is_none());
        assert!(slot.clinic_room.is_empty());
    }

    #[test_case("本診已停診", Some(ClinicState::Suspended); "suspended")]
    #[test_case("尚未開始看診", Some(ClinicState::NotStarted); "not started long form")]
    #[test_case("今日看診完畢", Some(ClinicState::Finished); "finished")]
    #[test_case("已結束看診", Some(ClinicState::Finished); "finished long form")]
    #[test_case("看診中", None; "running")]
    fn test_clinic_state_detect(text: &str, expected: Option<ClinicState>) {
        assert_eq!(ClinicState::detect(text), expected);
    }
}
