//! PostgreSQL clinic store
//!
//! Implements [`ClinicStore`] over the hospital, snapshot, subscription and
//! notification log tables. Schema migrations are managed outside this crate.

use crate::adapters::database::traits::ClinicStore;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    stored_department_from_row, stored_doctor_from_row, subscription_context_from_row,
    PostgreSQLSnapshot, SNAPSHOT_COLUMNS,
};
use crate::domain::{
    DepartmentId, DepartmentRecord, DoctorId, DoctorProfile, HospitalId, NotificationLogEntry,
    NotificationLogId, QueueWatchError, Result, SessionType, SnapshotRow, StoredDepartment,
    StoredDoctor, SubscriptionContext, SubscriptionId, Threshold, TrackingTarget,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

/// Live fields that keep their stored value when the incoming row has none
const WRITE_IF_PRESENT: [&str; 4] = [
    "current_number",
    "total_quota",
    "waiting_list",
    "clinic_queue_details",
];

/// Fields always overwritten by a newer observation
const OVERWRITE: [&str; 4] = ["current_registered", "is_full", "status", "scraped_at"];

/// Build the multi-row snapshot upsert for `row_count` rows
fn snapshot_upsert_sql(row_count: usize) -> String {
    let width = SNAPSHOT_COLUMNS.len();
    let values: Vec<String> = (0..row_count)
        .map(|row| {
            let placeholders: Vec<String> = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    let updates: Vec<String> = OVERWRITE
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .chain(
            WRITE_IF_PRESENT
                .iter()
                .map(|c| format!("{c} = COALESCE(EXCLUDED.{c}, appointment_snapshots.{c})")),
        )
        .collect();

    format!(
        "INSERT INTO appointment_snapshots ({}) VALUES {} \
         ON CONFLICT (doctor_id, department_id, session_date, session_type, clinic_room) \
         DO UPDATE SET {}",
        SNAPSHOT_COLUMNS.join(", "),
        values.join(", "),
        updates.join(", ")
    )
}

fn returned_id(row: &tokio_postgres::Row, statement: &str) -> Result<Uuid> {
    row.try_get("id")
        .map_err(|e| QueueWatchError::Database(format!("{statement} returned no id: {e}")))
}

/// PostgreSQL implementation of [`ClinicStore`]
pub struct PostgreSQLClinicStore {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLClinicStore {
    /// Create a store over a client
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl ClinicStore for PostgreSQLClinicStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn hospital_id(&self, hospital_code: &str) -> Result<Option<HospitalId>> {
        let rows = self
            .client
            .query(
                "SELECT id FROM hospitals WHERE code = $1 LIMIT 1",
                &[&hospital_code],
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.try_get::<_, Uuid>("id").ok())
            .map(HospitalId::new))
    }

    async fn upsert_department(
        &self,
        hospital_id: HospitalId,
        department: &DepartmentRecord,
    ) -> Result<DepartmentId> {
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO departments (hospital_id, code, name, category, sort_order)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (hospital_id, code) DO UPDATE SET
                    name = EXCLUDED.name,
                    sort_order = EXCLUDED.sort_order,
                    category = COALESCE(EXCLUDED.category, departments.category)
                RETURNING id
                "#,
                &[
                    hospital_id.as_uuid(),
                    &department.code,
                    &department.name,
                    &department.category,
                    &department.sort_order,
                ],
            )
            .await?;
        returned_id(&row, "Department upsert").map(DepartmentId::new)
    }

    async fn upsert_doctor(
        &self,
        hospital_id: HospitalId,
        department_id: DepartmentId,
        doctor: &DoctorProfile,
    ) -> Result<DoctorId> {
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO doctors (hospital_id, department_id, doctor_no, name, specialty)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (hospital_id, doctor_no, department_id) DO UPDATE SET
                    name = EXCLUDED.name,
                    specialty = COALESCE(EXCLUDED.specialty, doctors.specialty)
                RETURNING id
                "#,
                &[
                    hospital_id.as_uuid(),
                    department_id.as_uuid(),
                    &doctor.doctor_no,
                    &doctor.name,
                    &doctor.specialty,
                ],
            )
            .await?;
        returned_id(&row, "Doctor upsert").map(DoctorId::new)
    }

    async fn doctors_in_department(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<StoredDoctor>> {
        let rows = self
            .client
            .query(
                "SELECT id, hospital_id, department_id, doctor_no, name FROM doctors \
                 WHERE department_id = $1 ORDER BY doctor_no",
                &[department_id.as_uuid()],
            )
            .await?;
        rows.iter().map(stored_doctor_from_row).collect()
    }

    async fn tracking_targets(&self, from_date: NaiveDate) -> Result<Vec<TrackingTarget>> {
        let rows = self
            .client
            .query(
                "SELECT DISTINCT doctor_id, department_id FROM tracking_subscriptions \
                 WHERE is_active = TRUE AND session_date >= $1",
                &[&from_date],
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let doctor_id: Uuid = row.try_get("doctor_id").ok()?;
                let department_id: Option<Uuid> = row.try_get("department_id").ok()?;
                Some(TrackingTarget {
                    doctor_id: DoctorId::new(doctor_id),
                    department_id: department_id.map(DepartmentId::new),
                })
            })
            .collect())
    }

    async fn doctors_by_ids(&self, ids: &[DoctorId]) -> Result<Vec<StoredDoctor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = self
            .client
            .query(
                "SELECT id, hospital_id, department_id, doctor_no, name FROM doctors \
                 WHERE id = ANY($1)",
                &[&uuids],
            )
            .await?;
        rows.iter().map(stored_doctor_from_row).collect()
    }

    async fn departments_by_ids(&self, ids: &[DepartmentId]) -> Result<Vec<StoredDepartment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = self
            .client
            .query(
                "SELECT id, hospital_id, code, name FROM departments WHERE id = ANY($1)",
                &[&uuids],
            )
            .await?;
        rows.iter().map(stored_department_from_row).collect()
    }

    async fn upsert_snapshots(&self, rows: &[SnapshotRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let stored = rows
            .iter()
            .map(PostgreSQLSnapshot::from_domain)
            .collect::<Result<Vec<_>>>()?;
        let params: Vec<&(dyn ToSql + Sync)> = stored.iter().flat_map(|s| s.params()).collect();

        let written = self
            .client
            .execute(&snapshot_upsert_sql(stored.len()), &params)
            .await?;

        tracing::debug!(rows = written, "Snapshot batch upserted");
        Ok(written as usize)
    }

    async fn latest_snapshot(
        &self,
        doctor_id: DoctorId,
        session_date: NaiveDate,
        session_type: SessionType,
    ) -> Result<Option<SnapshotRow>> {
        let query = format!(
            "SELECT {} FROM appointment_snapshots \
             WHERE doctor_id = $1 AND session_date = $2 AND session_type = $3 \
             ORDER BY scraped_at DESC LIMIT 1",
            SNAPSHOT_COLUMNS.join(", ")
        );
        let rows = self
            .client
            .query(
                &query,
                &[doctor_id.as_uuid(), &session_date, &session_type.label()],
            )
            .await?;

        rows.first()
            .map(|row| PostgreSQLSnapshot::from_row(row)?.into_domain())
            .transpose()
    }

    async fn active_subscriptions(
        &self,
        session_date: NaiveDate,
    ) -> Result<Vec<SubscriptionContext>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT s.id, s.user_id, s.doctor_id, s.department_id, s.session_date,
                       s.session_type, s.appointment_number,
                       s.notify_at_20, s.notify_at_10, s.notify_at_5,
                       s.notified_20, s.notified_10, s.notified_5,
                       s.notify_email, s.notify_line, s.is_active,
                       d.name AS doctor_name,
                       dep.name AS department_name,
                       h.name AS hospital_name,
                       u.email AS email,
                       u.line_user_id AS line_user_id
                FROM tracking_subscriptions s
                LEFT JOIN doctors d ON d.id = s.doctor_id
                LEFT JOIN departments dep ON dep.id = COALESCE(s.department_id, d.department_id)
                LEFT JOIN hospitals h ON h.id = d.hospital_id
                LEFT JOIN users_local u ON u.id = s.user_id
                WHERE s.is_active = TRUE AND s.session_date = $1
                ORDER BY s.id
                "#,
                &[&session_date],
            )
            .await?;
        rows.iter().map(subscription_context_from_row).collect()
    }

    async fn mark_threshold_notified(
        &self,
        subscription_id: SubscriptionId,
        threshold: Threshold,
    ) -> Result<()> {
        // Column name comes from a closed enum, never from input
        let statement = format!(
            "UPDATE tracking_subscriptions SET {} = TRUE WHERE id = $1",
            threshold.notified_column()
        );
        self.client
            .execute(&statement, &[subscription_id.as_uuid()])
            .await?;
        Ok(())
    }

    async fn insert_notification_log(
        &self,
        entry: &NotificationLogEntry,
    ) -> Result<NotificationLogId> {
        let doctor_id = entry.doctor_id.map(|id| *id.as_uuid());
        let status_code = entry.status_code.map(i32::from);
        let row = self
            .client
            .query_one(
                r#"
                INSERT INTO notification_logs (
                    subscription_id, threshold, channel, recipient, message,
                    success, error_message, http_status_code, doctor_id,
                    hospital_name, department_name, clinic_room, session_date,
                    current_number, sent_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING id
                "#,
                &[
                    entry.subscription_id.as_uuid(),
                    &entry.threshold,
                    &entry.channel.as_str(),
                    &entry.recipient,
                    &entry.message,
                    &entry.success,
                    &entry.error_message,
                    &status_code,
                    &doctor_id,
                    &entry.hospital_name,
                    &entry.department_name,
                    &entry.clinic_room,
                    &entry.session_date,
                    &entry.current_number,
                    &entry.sent_at,
                ],
            )
            .await?;
        returned_id(&row, "Log insert").map(NotificationLogId::new)
    }

    async fn update_notification_log(
        &self,
        id: NotificationLogId,
        entry: &NotificationLogEntry,
    ) -> Result<()> {
        let status_code = entry.status_code.map(i32::from);
        self.client
            .execute(
                "UPDATE notification_logs SET success = $2, error_message = $3, \
                 http_status_code = COALESCE($4, http_status_code) WHERE id = $1",
                &[
                    id.as_uuid(),
                    &entry.success,
                    &entry.error_message,
                    &status_code,
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_sql_placeholders() {
        let sql = snapshot_upsert_sql(2);
        assert!(sql.contains("($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"));
        assert!(sql.contains("($14, "));
        assert!(sql.ends_with("clinic_queue_details = COALESCE(EXCLUDED.clinic_queue_details, appointment_snapshots.clinic_queue_details)"));
    }

    #[test]
    fn test_upsert_sql_write_if_present() {
        let sql = snapshot_upsert_sql(1);
        assert!(sql.contains(
            "current_number = COALESCE(EXCLUDED.current_number, appointment_snapshots.current_number)"
        ));
        assert!(sql.contains("current_registered = EXCLUDED.current_registered"));
        assert!(sql.contains(
            "ON CONFLICT (doctor_id, department_id, session_date, session_type, clinic_room)"
        ));
    }
}
