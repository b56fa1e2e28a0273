//! Persisted appointment snapshots

use crate::domain::ids::{DepartmentId, DoctorId};
use crate::domain::records::{ClinicProgress, DoctorSlot, QueueEntry};
use crate::domain::session::SessionType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a snapshot row across repeated scrapes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotKey {
    pub doctor_id: DoctorId,
    pub department_id: DepartmentId,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    pub clinic_room: String,
}

/// One stored observation of a doctor's session.
///
/// `current_number`, `total_quota`, `waiting_list` and `queue_details` are
/// write-only-when-present: a later row carrying `None` for any of them keeps
/// the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub doctor_id: DoctorId,
    pub department_id: DepartmentId,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    pub clinic_room: String,
    pub total_quota: Option<i32>,
    pub registered: Option<i32>,
    pub current_number: Option<i32>,
    pub is_full: bool,
    pub status: Option<String>,
    pub waiting_list: Option<Vec<i32>>,
    pub queue_details: Option<Vec<QueueEntry>>,
    pub scraped_at: DateTime<Utc>,
}

impl SnapshotRow {
    /// Schedule-only row built from a slot; live fields stay empty
    pub fn from_slot(
        doctor_id: DoctorId,
        department_id: DepartmentId,
        slot: &DoctorSlot,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            doctor_id,
            department_id,
            session_date: slot.session_date,
            session_type: slot.session_type,
            clinic_room: slot.clinic_room.clone(),
            total_quota: slot.total_quota,
            registered: slot.registered,
            current_number: slot.current_number,
            is_full: slot.is_full,
            status: slot.status.clone(),
            waiting_list: None,
            queue_details: None,
            scraped_at,
        }
    }

    /// Overlay live queue state onto the row.
    ///
    /// Live counts replace schedule counts only when the queue page reported them.
    pub fn apply_progress(&mut self, progress: &ClinicProgress) {
        self.current_number = Some(progress.current_number);
        if progress.total_quota.is_some() {
            self.total_quota = progress.total_quota;
        }
        if progress.registered.is_some() {
            self.registered = progress.registered;
        }
        if progress.status.is_some() {
            self.status = progress.status.clone();
        }
        if progress.waiting_list.is_some() {
            self.waiting_list = progress.waiting_list.clone();
        }
        if progress.queue_details.is_some() {
            self.queue_details = progress.queue_details.clone();
        }
    }

    /// Conflict key of this row
    pub fn key(&self) -> SnapshotKey {
        SnapshotKey {
            doctor_id: self.doctor_id,
            department_id: self.department_id,
            session_date: self.session_date,
            session_type: self.session_type,
            clinic_room: self.clinic_room.clone(),
        }
    }

    /// Merge a newer observation of the same key into this stored row
    pub fn merge_from(&mut self, newer: &SnapshotRow) {
        self.registered = newer.registered;
        self.is_full = newer.is_full;
        self.status = newer.status.clone();
        self.scraped_at = newer.scraped_at;
        if newer.current_number.is_some() {
            self.current_number = newer.current_number;
        }
        if newer.total_quota.is_some() {
            self.total_quota = newer.total_quota;
        }
        if newer.waiting_list.is_some() {
            self.waiting_list = newer.waiting_list.clone();
        }
        if newer.queue_details.is_some() {
            self.queue_details = newer.queue_details.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(current: Option<i32>) -> SnapshotRow {
        SnapshotRow {
            doctor_id: DoctorId::generate(),
            department_id: DepartmentId::generate(),
            session_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            session_type: SessionType::Morning,
            clinic_room: "230".to_string(),
            total_quota: Some(40),
            registered: Some(30),
            current_number: current,
            is_full: false,
            status: None,
            waiting_list: Some(vec![12, 13]),
            queue_details: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_merge_keeps_present_live_fields() {
        let mut stored = row(Some(11));
        let mut newer = row(None);
        newer.total_quota = None;
        newer.waiting_list = None;
        newer.registered = Some(33);

        stored.merge_from(&newer);

        assert_eq!(stored.current_number, Some(11));
        assert_eq!(stored.total_quota, Some(40));
        assert_eq!(stored.waiting_list, Some(vec![12, 13]));
        assert_eq!(stored.registered, Some(33));
    }

    #[test]
    fn test_apply_progress_overrides_only_reported_counts() {
        let mut snapshot = row(None);
        let progress = ClinicProgress::current_only("230", SessionType::Morning, 17);

        snapshot.apply_progress(&progress);

        assert_eq!(snapshot.current_number, Some(17));
        assert_eq!(snapshot.total_quota, Some(40));
        assert_eq!(snapshot.waiting_list, Some(vec![12, 13]));
    }
}
