//! Batched snapshot writes
//!
//! Rows are deduplicated by conflict key within one write, then upserted in
//! fixed-size batches. A failed batch is counted and the rest still go out.

use crate::adapters::database::ClinicStore;
use crate::core::ingest::summary::WriteSummary;
use crate::domain::{SnapshotKey, SnapshotRow};
use std::collections::HashMap;
use std::sync::Arc;

/// Default rows per upsert batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Writes snapshot rows to the store in batches
pub struct SnapshotWriter {
    store: Arc<dyn ClinicStore>,
    batch_size: usize,
    dry_run: bool,
}

impl SnapshotWriter {
    /// Create a writer; a zero batch size falls back to the default
    pub fn new(store: Arc<dyn ClinicStore>, batch_size: usize, dry_run: bool) -> Self {
        Self {
            store,
            batch_size: if batch_size == 0 {
                DEFAULT_BATCH_SIZE
            } else {
                batch_size
            },
            dry_run,
        }
    }

    /// Whether writes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Deduplicate and upsert rows, never failing as a whole
    pub async fn write(&self, rows: Vec<SnapshotRow>) -> WriteSummary {
        let rows_received = rows.len();
        let unique = dedupe_last_wins(rows);

        let mut summary = WriteSummary {
            rows_received,
            duplicates_merged: rows_received - unique.len(),
            ..WriteSummary::default()
        };

        if unique.is_empty() {
            return summary;
        }

        if self.dry_run {
            tracing::info!(
                rows = unique.len(),
                duplicates = summary.duplicates_merged,
                "Dry run, skipping snapshot write"
            );
            return summary;
        }

        for (index, batch) in unique.chunks(self.batch_size).enumerate() {
            summary.batches += 1;
            match self.store.upsert_snapshots(batch).await {
                Ok(written) => {
                    tracing::debug!(batch = index, rows = written, "Snapshot batch written");
                    summary.rows_written += written;
                }
                Err(e) => {
                    tracing::error!(
                        batch = index,
                        rows = batch.len(),
                        error = %e,
                        "Snapshot batch failed"
                    );
                    summary.failed_batches += 1;
                    summary
                        .errors
                        .push(format!("batch {index} ({} rows): {e}", batch.len()));
                }
            }
        }

        tracing::info!(
            received = summary.rows_received,
            written = summary.rows_written,
            batches = summary.batches,
            failed_batches = summary.failed_batches,
            "Snapshot write completed"
        );
        summary
    }
}

/// Keep one row per key. A later row replaces an earlier one outright and
/// takes the earlier row's position.
fn dedupe_last_wins(rows: Vec<SnapshotRow>) -> Vec<SnapshotRow> {
    let mut positions: HashMap<SnapshotKey, usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<SnapshotRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(&row.key()) {
            Some(&index) => unique[index] = row,
            None => {
                positions.insert(row.key(), unique.len());
                unique.push(row);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::InMemoryClinicStore;
    use crate::domain::{DepartmentId, DoctorId, SessionType};
    use chrono::{NaiveDate, Utc};

    fn row(doctor_id: DoctorId, department_id: DepartmentId, registered: i32) -> SnapshotRow {
        SnapshotRow {
            doctor_id,
            department_id,
            session_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            session_type: SessionType::Morning,
            clinic_room: "101".to_string(),
            total_quota: None,
            registered: Some(registered),
            current_number: None,
            is_full: false,
            status: None,
            waiting_list: None,
            queue_details: None,
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_dedupe_keeps_last_row_in_first_position() {
        let department = DepartmentId::generate();
        let (a, b) = (DoctorId::generate(), DoctorId::generate());
        let rows = vec![row(a, department, 1), row(b, department, 2), row(a, department, 3)];

        let unique = dedupe_last_wins(rows);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].doctor_id, a);
        assert_eq!(unique[0].registered, Some(3));
        assert_eq!(unique[1].doctor_id, b);
    }

    #[test]
    fn test_dedupe_replaces_whole_row() {
        let department = DepartmentId::generate();
        let doctor = DoctorId::generate();
        let mut first = row(doctor, department, 1);
        first.current_number = Some(7);

        let unique = dedupe_last_wins(vec![first, row(doctor, department, 2)]);

        // The store keeps 7; within a batch the later row simply wins
        assert_eq!(unique[0].current_number, None);
    }

    #[tokio::test]
    async fn test_write_in_batches() {
        let store = InMemoryClinicStore::new();
        let writer = SnapshotWriter::new(Arc::new(store.clone()), 2, false);
        let department = DepartmentId::generate();
        let rows: Vec<SnapshotRow> = (0..5)
            .map(|i| row(DoctorId::generate(), department, i))
            .collect();

        let summary = writer.write(rows).await;

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.rows_written, 5);
        assert_eq!(store.snapshots().await.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_later_batches() {
        let store = InMemoryClinicStore::new();
        store.fail_next_snapshot_batches(1).await;
        let writer = SnapshotWriter::new(Arc::new(store.clone()), 2, false);
        let department = DepartmentId::generate();
        let rows: Vec<SnapshotRow> = (0..4)
            .map(|i| row(DoctorId::generate(), department, i))
            .collect();

        let summary = writer.write(rows).await;

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(store.snapshots().await.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = InMemoryClinicStore::new();
        let writer = SnapshotWriter::new(Arc::new(store.clone()), 500, true);
        let rows = vec![row(DoctorId::generate(), DepartmentId::generate(), 1)];

        let summary = writer.write(rows).await;

        assert_eq!(summary.rows_received, 1);
        assert_eq!(summary.batches, 0);
        assert!(store.snapshots().await.is_empty());
    }
}
