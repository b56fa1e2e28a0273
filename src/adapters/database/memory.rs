//! In-memory clinic store
//!
//! Backs dry runs and tests. Applies the same conflict keys and
//! write-only-when-present merge as the PostgreSQL store.

use crate::adapters::database::traits::ClinicStore;
use crate::domain::{
    DepartmentId, DepartmentRecord, DoctorId, DoctorProfile, HospitalId, NotificationLogEntry,
    NotificationLogId, QueueWatchError, Result, SessionType, SnapshotKey, SnapshotRow,
    StoredDepartment, StoredDoctor, SubscriptionContext, SubscriptionId, Threshold,
    TrackingSubscription, TrackingTarget, UserId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct HospitalEntry {
    id: HospitalId,
    name: String,
}

#[derive(Debug, Clone)]
struct DepartmentEntry {
    stored: StoredDepartment,
    category: Option<String>,
    sort_order: i32,
}

#[derive(Debug, Clone)]
struct DoctorEntry {
    stored: StoredDoctor,
    specialty: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct UserContact {
    email: Option<String>,
    line_user_id: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    hospitals: HashMap<String, HospitalEntry>,
    departments: HashMap<(HospitalId, String), DepartmentEntry>,
    doctors: HashMap<(HospitalId, String, DepartmentId), DoctorEntry>,
    snapshots: BTreeMap<SnapshotKey, SnapshotRow>,
    subscriptions: Vec<TrackingSubscription>,
    users: HashMap<UserId, UserContact>,
    notification_logs: Vec<(NotificationLogId, NotificationLogEntry)>,
    failing_snapshot_batches: usize,
}

impl MemoryState {
    fn hospital_name(&self, id: HospitalId) -> Option<String> {
        self.hospitals
            .values()
            .find(|h| h.id == id)
            .map(|h| h.name.clone())
    }

    fn doctor(&self, id: DoctorId) -> Option<&DoctorEntry> {
        self.doctors.values().find(|d| d.stored.id == id)
    }

    fn department(&self, id: DepartmentId) -> Option<&DepartmentEntry> {
        self.departments.values().find(|d| d.stored.id == id)
    }
}

/// Clinic store held entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryClinicStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryClinicStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hospital, returning its id. Re-registering a code keeps the id.
    pub async fn add_hospital(&self, code: &str, name: &str) -> HospitalId {
        let mut state = self.state.lock().await;
        let entry = state
            .hospitals
            .entry(code.to_string())
            .or_insert_with(|| HospitalEntry {
                id: HospitalId::generate(),
                name: name.to_string(),
            });
        entry.name = name.to_string();
        entry.id
    }

    /// Register a user's contact details
    pub async fn add_user(&self, email: Option<&str>, line_user_id: Option<&str>) -> UserId {
        let id = UserId::generate();
        self.state.lock().await.users.insert(
            id,
            UserContact {
                email: email.map(str::to_string),
                line_user_id: line_user_id.map(str::to_string),
            },
        );
        id
    }

    /// Add a tracking subscription
    pub async fn add_subscription(&self, subscription: TrackingSubscription) {
        self.state.lock().await.subscriptions.push(subscription);
    }

    /// Current state of a subscription
    pub async fn subscription(&self, id: SubscriptionId) -> Option<TrackingSubscription> {
        self.state
            .lock()
            .await
            .subscriptions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Every stored snapshot in key order
    pub async fn snapshots(&self) -> Vec<SnapshotRow> {
        self.state.lock().await.snapshots.values().cloned().collect()
    }

    /// Every notification log row in insertion order
    pub async fn notification_logs(&self) -> Vec<NotificationLogEntry> {
        self.state
            .lock()
            .await
            .notification_logs
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Stored departments of a hospital, by sort order
    pub async fn departments(&self, hospital_id: HospitalId) -> Vec<DepartmentRecord> {
        let state = self.state.lock().await;
        let hospital_code = state
            .hospitals
            .iter()
            .find(|(_, h)| h.id == hospital_id)
            .map(|(code, _)| code.clone())
            .unwrap_or_default();

        let mut departments: Vec<DepartmentRecord> = state
            .departments
            .values()
            .filter(|d| d.stored.hospital_id == hospital_id)
            .map(|d| {
                let mut record = DepartmentRecord::new(
                    hospital_code.clone(),
                    d.stored.code.clone(),
                    d.stored.name.clone(),
                )
                .with_sort_order(d.sort_order);
                record.category = d.category.clone();
                record
            })
            .collect();
        departments.sort_by_key(|d| d.sort_order);
        departments
    }

    /// Number of stored doctor rows
    pub async fn doctor_count(&self) -> usize {
        self.state.lock().await.doctors.len()
    }

    /// Stored specialty of a doctor
    pub async fn doctor_specialty(&self, id: DoctorId) -> Option<String> {
        self.state
            .lock()
            .await
            .doctor(id)
            .and_then(|d| d.specialty.clone())
    }

    /// Make the next `count` snapshot batches fail
    pub async fn fail_next_snapshot_batches(&self, count: usize) {
        self.state.lock().await.failing_snapshot_batches = count;
    }
}

#[async_trait]
impl ClinicStore for InMemoryClinicStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn hospital_id(&self, hospital_code: &str) -> Result<Option<HospitalId>> {
        Ok(self
            .state
            .lock()
            .await
            .hospitals
            .get(hospital_code)
            .map(|h| h.id))
    }

    async fn upsert_department(
        &self,
        hospital_id: HospitalId,
        department: &DepartmentRecord,
    ) -> Result<DepartmentId> {
        let mut state = self.state.lock().await;
        let entry = state
            .departments
            .entry((hospital_id, department.code.clone()))
            .or_insert_with(|| DepartmentEntry {
                stored: StoredDepartment {
                    id: DepartmentId::generate(),
                    hospital_id,
                    code: department.code.clone(),
                    name: department.name.clone(),
                },
                category: None,
                sort_order: 0,
            });

        entry.stored.name = department.name.clone();
        entry.sort_order = department.sort_order;
        if department.category.is_some() {
            entry.category = department.category.clone();
        }
        Ok(entry.stored.id)
    }

    async fn upsert_doctor(
        &self,
        hospital_id: HospitalId,
        department_id: DepartmentId,
        doctor: &DoctorProfile,
    ) -> Result<DoctorId> {
        let mut state = self.state.lock().await;
        let entry = state
            .doctors
            .entry((hospital_id, doctor.doctor_no.clone(), department_id))
            .or_insert_with(|| DoctorEntry {
                stored: StoredDoctor {
                    id: DoctorId::generate(),
                    hospital_id,
                    department_id,
                    doctor_no: doctor.doctor_no.clone(),
                    name: doctor.name.clone(),
                },
                specialty: None,
            });

        entry.stored.name = doctor.name.clone();
        if doctor.specialty.is_some() {
            entry.specialty = doctor.specialty.clone();
        }
        Ok(entry.stored.id)
    }

    async fn doctors_in_department(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<StoredDoctor>> {
        let state = self.state.lock().await;
        let mut doctors: Vec<StoredDoctor> = state
            .doctors
            .values()
            .filter(|d| d.stored.department_id == department_id)
            .map(|d| d.stored.clone())
            .collect();
        doctors.sort_by(|a, b| a.doctor_no.cmp(&b.doctor_no));
        Ok(doctors)
    }

    async fn tracking_targets(&self, from_date: NaiveDate) -> Result<Vec<TrackingTarget>> {
        Ok(self
            .state
            .lock()
            .await
            .subscriptions
            .iter()
            .filter(|s| s.is_active && s.session_date >= from_date)
            .map(|s| TrackingTarget {
                doctor_id: s.doctor_id,
                department_id: s.department_id,
            })
            .collect())
    }

    async fn doctors_by_ids(&self, ids: &[DoctorId]) -> Result<Vec<StoredDoctor>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.doctor(*id).map(|d| d.stored.clone()))
            .collect())
    }

    async fn departments_by_ids(&self, ids: &[DepartmentId]) -> Result<Vec<StoredDepartment>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.department(*id).map(|d| d.stored.clone()))
            .collect())
    }

    async fn upsert_snapshots(&self, rows: &[SnapshotRow]) -> Result<usize> {
        let mut state = self.state.lock().await;
        if state.failing_snapshot_batches > 0 {
            state.failing_snapshot_batches -= 1;
            return Err(QueueWatchError::Database(
                "Simulated snapshot batch failure".to_string(),
            ));
        }

        for row in rows {
            state
                .snapshots
                .entry(row.key())
                .and_modify(|stored| stored.merge_from(row))
                .or_insert_with(|| row.clone());
        }
        Ok(rows.len())
    }

    async fn latest_snapshot(
        &self,
        doctor_id: DoctorId,
        session_date: NaiveDate,
        session_type: SessionType,
    ) -> Result<Option<SnapshotRow>> {
        Ok(self
            .state
            .lock()
            .await
            .snapshots
            .values()
            .filter(|s| {
                s.doctor_id == doctor_id
                    && s.session_date == session_date
                    && s.session_type == session_type
            })
            .max_by_key(|s| s.scraped_at)
            .cloned())
    }

    async fn active_subscriptions(
        &self,
        session_date: NaiveDate,
    ) -> Result<Vec<SubscriptionContext>> {
        let state = self.state.lock().await;
        let contexts = state
            .subscriptions
            .iter()
            .filter(|s| s.is_active && s.session_date == session_date)
            .map(|s| {
                let doctor = state.doctor(s.doctor_id);
                let department_id = s
                    .department_id
                    .or_else(|| doctor.map(|d| d.stored.department_id));
                let contact = state.users.get(&s.user_id).cloned().unwrap_or_default();

                SubscriptionContext {
                    subscription: s.clone(),
                    doctor_name: doctor.map(|d| d.stored.name.clone()),
                    department_name: department_id
                        .and_then(|id| state.department(id))
                        .map(|d| d.stored.name.clone()),
                    hospital_name: doctor.and_then(|d| state.hospital_name(d.stored.hospital_id)),
                    email: contact.email,
                    line_user_id: contact.line_user_id,
                }
            })
            .collect();
        Ok(contexts)
    }

    async fn mark_threshold_notified(
        &self,
        subscription_id: SubscriptionId,
        threshold: Threshold,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| {
                QueueWatchError::Database(format!("Subscription {subscription_id} not found"))
            })?;
        subscription.notified.set(threshold, true);
        Ok(())
    }

    async fn insert_notification_log(
        &self,
        entry: &NotificationLogEntry,
    ) -> Result<NotificationLogId> {
        let id = NotificationLogId::generate();
        self.state
            .lock()
            .await
            .notification_logs
            .push((id, entry.clone()));
        Ok(id)
    }

    async fn update_notification_log(
        &self,
        id: NotificationLogId,
        entry: &NotificationLogEntry,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let (_, stored) = state
            .notification_logs
            .iter_mut()
            .find(|(log_id, _)| *log_id == id)
            .ok_or_else(|| QueueWatchError::Database(format!("Notification log {id} not found")))?;
        *stored = entry.clone();
        Ok(())
    }
}
