//! PostgreSQL row models
//!
//! Column layouts of the tables the store reads and writes, with conversion
//! to and from domain types.

use crate::domain::{
    DepartmentId, DoctorId, HospitalId, QueueEntry, QueueWatchError, Result, SessionType,
    SnapshotRow, StoredDepartment, StoredDoctor, SubscriptionContext, SubscriptionId,
    ThresholdFlags, TrackingSubscription, UserId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::Row;
use uuid::Uuid;

/// Columns written by a snapshot upsert, in placeholder order
pub const SNAPSHOT_COLUMNS: [&str; 13] = [
    "doctor_id",
    "department_id",
    "session_date",
    "session_type",
    "clinic_room",
    "total_quota",
    "current_registered",
    "current_number",
    "is_full",
    "status",
    "waiting_list",
    "clinic_queue_details",
    "scraped_at",
];

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| QueueWatchError::Database(format!("Failed to read column {name}: {e}")))
}

fn session_type(label: &str) -> Result<SessionType> {
    SessionType::from_label(label)
        .ok_or_else(|| QueueWatchError::Database(format!("Unknown session type '{label}'")))
}

/// Snapshot row as stored in `appointment_snapshots`
#[derive(Debug, Clone)]
pub struct PostgreSQLSnapshot {
    pub doctor_id: Uuid,
    pub department_id: Uuid,
    pub session_date: NaiveDate,
    pub session_type: String,
    pub clinic_room: String,
    pub total_quota: Option<i32>,
    pub current_registered: Option<i32>,
    pub current_number: Option<i32>,
    pub is_full: bool,
    pub status: Option<String>,
    pub waiting_list: Option<Value>,
    pub clinic_queue_details: Option<Value>,
    pub scraped_at: DateTime<Utc>,
}

impl PostgreSQLSnapshot {
    /// Convert from a domain snapshot
    pub fn from_domain(row: &SnapshotRow) -> Result<Self> {
        let waiting_list = row
            .waiting_list
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let clinic_queue_details = row
            .queue_details
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        Ok(Self {
            doctor_id: *row.doctor_id.as_uuid(),
            department_id: *row.department_id.as_uuid(),
            session_date: row.session_date,
            session_type: row.session_type.label().to_string(),
            clinic_room: row.clinic_room.clone(),
            total_quota: row.total_quota,
            current_registered: row.registered,
            current_number: row.current_number,
            is_full: row.is_full,
            status: row.status.clone(),
            waiting_list,
            clinic_queue_details,
            scraped_at: row.scraped_at,
        })
    }

    /// Read a full `appointment_snapshots` row
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            doctor_id: column(row, "doctor_id")?,
            department_id: column(row, "department_id")?,
            session_date: column(row, "session_date")?,
            session_type: column(row, "session_type")?,
            clinic_room: column(row, "clinic_room")?,
            total_quota: column(row, "total_quota")?,
            current_registered: column(row, "current_registered")?,
            current_number: column(row, "current_number")?,
            is_full: column(row, "is_full")?,
            status: column(row, "status")?,
            waiting_list: column(row, "waiting_list")?,
            clinic_queue_details: column(row, "clinic_queue_details")?,
            scraped_at: column(row, "scraped_at")?,
        })
    }

    /// Convert to the domain snapshot
    pub fn into_domain(self) -> Result<SnapshotRow> {
        let waiting_list: Option<Vec<i32>> = self
            .waiting_list
            .filter(|v| !v.is_null())
            .map(serde_json::from_value)
            .transpose()?;
        let queue_details: Option<Vec<QueueEntry>> = self
            .clinic_queue_details
            .filter(|v| !v.is_null())
            .map(serde_json::from_value)
            .transpose()?;

        Ok(SnapshotRow {
            doctor_id: DoctorId::new(self.doctor_id),
            department_id: DepartmentId::new(self.department_id),
            session_date: self.session_date,
            session_type: session_type(&self.session_type)?,
            clinic_room: self.clinic_room,
            total_quota: self.total_quota,
            registered: self.current_registered,
            current_number: self.current_number,
            is_full: self.is_full,
            status: self.status,
            waiting_list,
            queue_details,
            scraped_at: self.scraped_at,
        })
    }

    /// Parameters in [`SNAPSHOT_COLUMNS`] order
    pub fn params(&self) -> [&(dyn ToSql + Sync); 13] {
        [
            &self.doctor_id,
            &self.department_id,
            &self.session_date,
            &self.session_type,
            &self.clinic_room,
            &self.total_quota,
            &self.current_registered,
            &self.current_number,
            &self.is_full,
            &self.status,
            &self.waiting_list,
            &self.clinic_queue_details,
            &self.scraped_at,
        ]
    }
}

/// Read a `doctors` row
pub fn stored_doctor_from_row(row: &Row) -> Result<StoredDoctor> {
    Ok(StoredDoctor {
        id: DoctorId::new(column(row, "id")?),
        hospital_id: HospitalId::new(column(row, "hospital_id")?),
        department_id: DepartmentId::new(column(row, "department_id")?),
        doctor_no: column(row, "doctor_no")?,
        name: column(row, "name")?,
    })
}

/// Read a `departments` row
pub fn stored_department_from_row(row: &Row) -> Result<StoredDepartment> {
    Ok(StoredDepartment {
        id: DepartmentId::new(column(row, "id")?),
        hospital_id: HospitalId::new(column(row, "hospital_id")?),
        code: column(row, "code")?,
        name: column(row, "name")?,
    })
}

/// Read a subscription row joined with its display names and recipients
///
/// Expects the aliases produced by the store's subscription query:
/// `doctor_name`, `department_name`, `hospital_name`, `email`, `line_user_id`.
pub fn subscription_context_from_row(row: &Row) -> Result<SubscriptionContext> {
    let department_id: Option<Uuid> = column(row, "department_id")?;
    let session_label: String = column(row, "session_type")?;

    let subscription = TrackingSubscription {
        id: SubscriptionId::new(column(row, "id")?),
        user_id: UserId::new(column(row, "user_id")?),
        doctor_id: DoctorId::new(column(row, "doctor_id")?),
        department_id: department_id.map(DepartmentId::new),
        session_date: column(row, "session_date")?,
        session_type: session_type(&session_label)?,
        target_number: column(row, "appointment_number")?,
        notify_at: ThresholdFlags {
            at_20: column::<Option<bool>>(row, "notify_at_20")?.unwrap_or(true),
            at_10: column::<Option<bool>>(row, "notify_at_10")?.unwrap_or(true),
            at_5: column::<Option<bool>>(row, "notify_at_5")?.unwrap_or(true),
        },
        notified: ThresholdFlags {
            at_20: column::<Option<bool>>(row, "notified_20")?.unwrap_or(false),
            at_10: column::<Option<bool>>(row, "notified_10")?.unwrap_or(false),
            at_5: column::<Option<bool>>(row, "notified_5")?.unwrap_or(false),
        },
        notify_email: column::<Option<bool>>(row, "notify_email")?.unwrap_or(true),
        notify_line: column::<Option<bool>>(row, "notify_line")?.unwrap_or(false),
        is_active: column(row, "is_active")?,
    };

    Ok(SubscriptionContext {
        subscription,
        doctor_name: column(row, "doctor_name")?,
        department_name: column(row, "department_name")?,
        hospital_name: column(row, "hospital_name")?,
        email: column(row, "email")?,
        line_user_id: column(row, "line_user_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SnapshotRow {
        SnapshotRow {
            doctor_id: DoctorId::generate(),
            department_id: DepartmentId::generate(),
            session_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            session_type: SessionType::Evening,
            clinic_room: "0101".to_string(),
            total_quota: Some(30),
            registered: Some(28),
            current_number: Some(7),
            is_full: false,
            status: None,
            waiting_list: Some(vec![8, 9]),
            queue_details: Some(vec![QueueEntry {
                number: 7,
                status: "看診中".to_string(),
            }]),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_snapshot_columns_use_store_names() {
        let stored = PostgreSQLSnapshot::from_domain(&snapshot()).unwrap();
        assert_eq!(stored.session_type, "晚上");
        assert_eq!(stored.current_registered, Some(28));
        assert_eq!(stored.waiting_list, Some(serde_json::json!([8, 9])));
        assert_eq!(
            stored.clinic_queue_details,
            Some(serde_json::json!([{"number": 7, "status": "看診中"}]))
        );
        assert_eq!(stored.params().len(), SNAPSHOT_COLUMNS.len());
    }

    #[test]
    fn test_snapshot_back_to_domain() {
        let original = snapshot();
        let restored = PostgreSQLSnapshot::from_domain(&original)
            .unwrap()
            .into_domain()
            .unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_json_null_lists_read_as_absent() {
        let mut stored = PostgreSQLSnapshot::from_domain(&snapshot()).unwrap();
        stored.waiting_list = Some(Value::Null);
        stored.clinic_queue_details = None;

        let restored = stored.into_domain().unwrap();
        assert!(restored.waiting_list.is_none());
        assert!(restored.queue_details.is_none());
    }
}
