//! Clinic store abstraction
//!
//! This module defines the trait that storage backends implement so the
//! orchestrator and notification engine never depend on a concrete database.

use crate::domain::{
    DepartmentId, DepartmentRecord, DoctorId, DoctorProfile, HospitalId, NotificationLogEntry,
    NotificationLogId, Result, SessionType, SnapshotRow, StoredDepartment, StoredDoctor,
    SubscriptionContext, SubscriptionId, Threshold, TrackingTarget,
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Persistent store for hospitals, snapshots, subscriptions and the notification log
///
/// Rows written through [`ClinicStore::upsert_snapshots`] follow the
/// write-only-when-present rule documented on [`SnapshotRow`]: a `None`
/// current number, total quota, waiting list or queue detail never
/// overwrites a stored value.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Resolve a hospital by its code
    async fn hospital_id(&self, hospital_code: &str) -> Result<Option<HospitalId>>;

    /// Insert or update a department keyed by (hospital, code)
    async fn upsert_department(
        &self,
        hospital_id: HospitalId,
        department: &DepartmentRecord,
    ) -> Result<DepartmentId>;

    /// Insert or update a doctor keyed by (hospital, doctor number, department)
    async fn upsert_doctor(
        &self,
        hospital_id: HospitalId,
        department_id: DepartmentId,
        doctor: &DoctorProfile,
    ) -> Result<DoctorId>;

    /// Every doctor stored under a department
    async fn doctors_in_department(&self, department_id: DepartmentId)
        -> Result<Vec<StoredDoctor>>;

    /// Doctor and department ids of active subscriptions dated on or after `from_date`
    async fn tracking_targets(&self, from_date: NaiveDate) -> Result<Vec<TrackingTarget>>;

    /// Look up doctors by id; unknown ids are ignored
    async fn doctors_by_ids(&self, ids: &[DoctorId]) -> Result<Vec<StoredDoctor>>;

    /// Look up departments by id; unknown ids are ignored
    async fn departments_by_ids(&self, ids: &[DepartmentId]) -> Result<Vec<StoredDepartment>>;

    /// Upsert one batch of snapshot rows, returning how many were written
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be written. A failed batch
    /// leaves earlier batches in place.
    async fn upsert_snapshots(&self, rows: &[SnapshotRow]) -> Result<usize>;

    /// Most recently captured snapshot for a doctor's session
    async fn latest_snapshot(
        &self,
        doctor_id: DoctorId,
        session_date: NaiveDate,
        session_type: SessionType,
    ) -> Result<Option<SnapshotRow>>;

    /// Active subscriptions for a date, joined with display names and recipients
    async fn active_subscriptions(&self, session_date: NaiveDate)
        -> Result<Vec<SubscriptionContext>>;

    /// Set the notified flag of one threshold
    async fn mark_threshold_notified(
        &self,
        subscription_id: SubscriptionId,
        threshold: Threshold,
    ) -> Result<()>;

    /// Record a send attempt, returning the new row id
    async fn insert_notification_log(
        &self,
        entry: &NotificationLogEntry,
    ) -> Result<NotificationLogId>;

    /// Overwrite the outcome fields of an existing log row
    async fn update_notification_log(
        &self,
        id: NotificationLogId,
        entry: &NotificationLogEntry,
    ) -> Result<()>;
}
