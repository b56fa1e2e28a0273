//! Ingestion orchestrator - runs full scans, tracked scans and morning syncs
//!
//! This module coordinates hospital adapters, the clinic store, the snapshot
//! writer and the notification engine. It is built once and shared by every
//! scheduled job and manual trigger.

use crate::adapters::database::{create_clinic_store, ClinicStore};
use crate::adapters::hospital::{create_hospital_adapters, HospitalAdapter};
use crate::adapters::messaging::{create_email_sender, create_instant_messenger};
use crate::config::QueueWatchConfig;
use crate::core::ingest::gate::LiveFetchGate;
use crate::core::ingest::summary::{HospitalScan, ScanMode, ScanSummary};
use crate::core::ingest::writer::SnapshotWriter;
use crate::core::notify::NotificationEngine;
use crate::domain::{
    ClinicProgress, Clock, DepartmentId, DepartmentRecord, DoctorId, DoctorProfile, DoctorSlot,
    HospitalId, Result, SessionType, SnapshotRow, StoredDepartment, StoredDoctor, SystemClock,
};
use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Random pause between department fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min_ms: u64,
    max_ms: u64,
}

impl PolitenessDelay {
    /// Uniform delay in `[min_ms, max_ms]`
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Pick the next delay
    pub fn pick(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    async fn wait(&self) {
        let delay = self.pick();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Subscriptions reduced to the ids a tracked scan cares about
#[derive(Debug, Default)]
struct WorkingSet {
    doctors: HashSet<DoctorId>,
    explicit_departments: HashSet<DepartmentId>,
    tracked_doctors: Vec<StoredDoctor>,
    departments: Vec<StoredDepartment>,
}

impl WorkingSet {
    fn needs_progress(&self, department_id: DepartmentId, doctor_id: DoctorId) -> bool {
        self.explicit_departments.contains(&department_id) || self.doctors.contains(&doctor_id)
    }
}

/// Rows and counts produced by one department
#[derive(Debug, Default)]
struct DepartmentRows {
    rows: Vec<SnapshotRow>,
    live_fetches: usize,
    skipped: Vec<String>,
}

type ProgressCache = HashMap<(String, SessionType), Option<ClinicProgress>>;

/// Ingestion orchestrator
pub struct IngestOrchestrator {
    adapters: Vec<Arc<dyn HospitalAdapter>>,
    store: Arc<dyn ClinicStore>,
    writer: SnapshotWriter,
    gate: LiveFetchGate,
    politeness: PolitenessDelay,
    clock: Arc<dyn Clock>,
    notifier: Option<NotificationEngine>,
}

impl IngestOrchestrator {
    /// Create an orchestrator without a notification engine
    pub fn new(
        adapters: Vec<Arc<dyn HospitalAdapter>>,
        store: Arc<dyn ClinicStore>,
        writer: SnapshotWriter,
        gate: LiveFetchGate,
        politeness: PolitenessDelay,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            adapters,
            store,
            writer,
            gate,
            politeness,
            clock,
            notifier: None,
        }
    }

    /// Run this engine after tracked scans and morning syncs
    pub fn with_notifier(mut self, notifier: NotificationEngine) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build every collaborator from configuration
    ///
    /// `dry_run` overrides `application.dry_run` when set.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an adapter, the store or a
    /// messaging client cannot be created.
    pub fn from_config(config: &QueueWatchConfig, dry_run: bool) -> Result<Self> {
        let dry_run = dry_run || config.application.dry_run;
        let adapters = create_hospital_adapters(config.enabled_hospitals(), &config.scraper)?;
        let store = create_clinic_store(config)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let writer = SnapshotWriter::new(
            store.clone(),
            config.schedule.snapshot_batch_size,
            dry_run,
        );
        let mut orchestrator = Self::new(
            adapters,
            store.clone(),
            writer,
            LiveFetchGate::new(config.schedule.live_window_hours),
            PolitenessDelay::new(
                config.scraper.politeness_min_ms,
                config.scraper.politeness_max_ms,
            ),
            clock.clone(),
        );

        if config.notification.enabled {
            let engine = NotificationEngine::new(
                store,
                create_email_sender(&config.notification)?,
                create_instant_messenger(&config.notification)?,
                clock,
            );
            orchestrator = orchestrator.with_notifier(engine);
        }

        tracing::info!(
            hospitals = orchestrator.adapters.len(),
            dry_run,
            notifications = config.notification.enabled,
            "Ingest orchestrator ready"
        );
        Ok(orchestrator)
    }

    /// Shared store handle
    pub fn store(&self) -> Arc<dyn ClinicStore> {
        self.store.clone()
    }

    /// Codes of the configured hospitals
    pub fn hospital_codes(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|a| a.hospital_code().to_string())
            .collect()
    }

    /// Run one cycle by mode
    pub async fn run(&self, mode: ScanMode, hospital: Option<&str>) -> ScanSummary {
        match mode {
            ScanMode::Full => self.full_scan(hospital).await,
            ScanMode::Tracked => self.tracked_scan(hospital).await,
            ScanMode::MorningSync => self.morning_sync(hospital).await,
        }
    }

    /// Scrape every department of every hospital, schedule only
    pub async fn full_scan(&self, hospital: Option<&str>) -> ScanSummary {
        let started = Instant::now();
        let mut summary = ScanSummary::new(ScanMode::Full);

        let adapters = self.select_adapters(hospital, &mut summary);
        summary.hospitals = join_all(
            adapters
                .into_iter()
                .map(|adapter| self.full_scan_hospital(adapter)),
        )
        .await;

        self.finish(summary, started)
    }

    /// Scrape tracked departments and fetch live progress where due, then notify
    pub async fn tracked_scan(&self, hospital: Option<&str>) -> ScanSummary {
        let started = Instant::now();
        let mut summary = ScanSummary::new(ScanMode::Tracked);

        let adapters = self.select_adapters(hospital, &mut summary);
        match self.load_working_set().await {
            Ok(working) if working.departments.is_empty() => {
                tracing::info!("No tracked departments, nothing to scan");
            }
            Ok(working) => {
                let working = &working;
                summary.hospitals = join_all(
                    adapters
                        .into_iter()
                        .map(|adapter| self.tracked_scan_hospital(adapter, working)),
                )
                .await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load tracking targets");
                summary.errors.push(format!("tracking targets: {e}"));
            }
        }

        self.notify(&mut summary).await;
        self.finish(summary, started)
    }

    /// Refresh today's subscribed sessions with live progress, ignoring the
    /// time gate, then notify
    pub async fn morning_sync(&self, hospital: Option<&str>) -> ScanSummary {
        let started = Instant::now();
        let mut summary = ScanSummary::new(ScanMode::MorningSync);
        let today = self.clock.today();

        let adapters = self.select_adapters(hospital, &mut summary);
        match self.store.active_subscriptions(today).await {
            Ok(contexts) => {
                let doctor_ids: Vec<DoctorId> = contexts
                    .iter()
                    .map(|c| c.subscription.doctor_id)
                    .collect::<HashSet<_>>()
                    .into_iter()
                    .collect();

                match self.store.doctors_by_ids(&doctor_ids).await {
                    Ok(doctors) => {
                        let hospital_of: HashMap<DoctorId, HospitalId> =
                            doctors.iter().map(|d| (d.id, d.hospital_id)).collect();
                        let sessions: Vec<(DoctorId, SessionType)> = contexts
                            .iter()
                            .map(|c| (c.subscription.doctor_id, c.subscription.session_type))
                            .collect::<HashSet<_>>()
                            .into_iter()
                            .collect();
                        let (sessions, hospital_of) = (&sessions, &hospital_of);

                        summary.hospitals = join_all(adapters.into_iter().map(|adapter| {
                            self.morning_sync_hospital(adapter, sessions, hospital_of)
                        }))
                        .await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to load subscribed doctors");
                        summary.errors.push(format!("subscribed doctors: {e}"));
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load today's subscriptions");
                summary.errors.push(format!("subscriptions: {e}"));
            }
        }

        self.notify(&mut summary).await;
        self.finish(summary, started)
    }

    /// Release adapter resources
    pub async fn close(&self) {
        for adapter in &self.adapters {
            adapter.close().await;
        }
    }

    fn select_adapters(
        &self,
        hospital: Option<&str>,
        summary: &mut ScanSummary,
    ) -> Vec<Arc<dyn HospitalAdapter>> {
        let Some(code) = hospital else {
            return self.adapters.clone();
        };

        let selected: Vec<_> = self
            .adapters
            .iter()
            .filter(|a| a.hospital_code().eq_ignore_ascii_case(code))
            .cloned()
            .collect();
        if selected.is_empty() {
            tracing::warn!(hospital = %code, "Hospital is not configured");
            summary
                .errors
                .push(format!("hospital {code} is not configured"));
        }
        selected
    }

    /// Resolve a hospital's store id; `None` is recorded on the scan
    async fn resolve_hospital(&self, scan: &mut HospitalScan) -> Option<HospitalId> {
        match self.store.hospital_id(&scan.hospital).await {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                tracing::warn!(hospital = %scan.hospital, "Hospital not found in store, skipping");
                scan.errors
                    .push(format!("hospital {} not found in store", scan.hospital));
                None
            }
            Err(e) => {
                tracing::error!(hospital = %scan.hospital, error = %e, "Hospital lookup failed");
                scan.errors.push(format!("hospital lookup: {e}"));
                None
            }
        }
    }

    async fn full_scan_hospital(&self, adapter: Arc<dyn HospitalAdapter>) -> HospitalScan {
        let started = Instant::now();
        let code = adapter.hospital_code().to_string();
        crate::log_scan_start!(ScanMode::Full, code);
        let mut scan = HospitalScan::new(&code);

        let Some(hospital_id) = self.resolve_hospital(&mut scan).await else {
            return scan;
        };

        let departments = match adapter.fetch_departments().await {
            Ok(departments) => departments,
            Err(e) => {
                tracing::error!(hospital = %code, error = %e, "Failed to fetch departments");
                scan.errors.push(format!("departments: {e}"));
                return scan;
            }
        };
        let departments: Vec<DepartmentRecord> = departments
            .into_iter()
            .filter(|d| adapter.accepts_department(d))
            .collect();
        tracing::info!(hospital = %code, departments = departments.len(), "Departments listed");

        let mut rows = Vec::new();
        for (index, department) in departments.iter().enumerate() {
            if index > 0 {
                self.politeness.wait().await;
            }
            match self
                .scan_department_schedule(adapter.as_ref(), hospital_id, department)
                .await
            {
                Ok(found) => {
                    scan.departments += 1;
                    scan.slots += found.rows.len();
                    for error in found.skipped {
                        scan.skip(error);
                    }
                    rows.extend(found.rows);
                }
                Err(e) => {
                    crate::log_unit_skipped!("department", department.code, e);
                    scan.skip(format!("department {}: {e}", department.code));
                }
            }
        }

        scan.writes = self.writer.write(rows).await;
        crate::log_scan_complete!(ScanMode::Full, code, scan.writes.rows_written, started.elapsed());
        scan
    }

    async fn scan_department_schedule(
        &self,
        adapter: &dyn HospitalAdapter,
        hospital_id: HospitalId,
        department: &DepartmentRecord,
    ) -> Result<DepartmentRows> {
        let department_id = self.store.upsert_department(hospital_id, department).await?;
        let slots = adapter.fetch_schedule(&department.code).await?;
        let scraped_at = self.clock.now().with_timezone(&Utc);

        let mut found = DepartmentRows::default();
        let mut doctor_cache: HashMap<String, DoctorId> = HashMap::new();
        for slot in &slots {
            let doctor_id = match self
                .doctor_id_for(hospital_id, department_id, slot, &mut doctor_cache)
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    crate::log_unit_skipped!("doctor", slot.doctor_no, e);
                    found.skipped.push(format!("doctor {}: {e}", slot.doctor_no));
                    continue;
                }
            };
            found
                .rows
                .push(SnapshotRow::from_slot(doctor_id, department_id, slot, scraped_at));
        }

        tracing::debug!(
            department = %department.code,
            slots = slots.len(),
            doctors = doctor_cache.len(),
            "Department schedule scanned"
        );
        Ok(found)
    }

    /// Doctor id for a slot, upserting doctors not yet in the cache
    async fn doctor_id_for(
        &self,
        hospital_id: HospitalId,
        department_id: DepartmentId,
        slot: &DoctorSlot,
        cache: &mut HashMap<String, DoctorId>,
    ) -> Result<DoctorId> {
        if let Some(id) = cache.get(&slot.doctor_no) {
            return Ok(*id);
        }
        let id = self
            .store
            .upsert_doctor(hospital_id, department_id, &DoctorProfile::from(slot))
            .await?;
        cache.insert(slot.doctor_no.clone(), id);
        Ok(id)
    }

    async fn load_working_set(&self) -> Result<WorkingSet> {
        let targets = self.store.tracking_targets(self.clock.today()).await?;

        let mut working = WorkingSet::default();
        for target in &targets {
            working.doctors.insert(target.doctor_id);
            if let Some(department_id) = target.department_id {
                working.explicit_departments.insert(department_id);
            }
        }

        let doctor_ids: Vec<DoctorId> = working.doctors.iter().copied().collect();
        working.tracked_doctors = self.store.doctors_by_ids(&doctor_ids).await?;

        let department_ids: Vec<DepartmentId> = working
            .explicit_departments
            .iter()
            .copied()
            .chain(working.tracked_doctors.iter().map(|d| d.department_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        working.departments = self.store.departments_by_ids(&department_ids).await?;

        tracing::info!(
            targets = targets.len(),
            doctors = working.doctors.len(),
            departments = working.departments.len(),
            "Tracking working set loaded"
        );
        Ok(working)
    }

    async fn tracked_scan_hospital(
        &self,
        adapter: Arc<dyn HospitalAdapter>,
        working: &WorkingSet,
    ) -> HospitalScan {
        let started = Instant::now();
        let code = adapter.hospital_code().to_string();
        crate::log_scan_start!(ScanMode::Tracked, code);
        let mut scan = HospitalScan::new(&code);

        let Some(hospital_id) = self.resolve_hospital(&mut scan).await else {
            return scan;
        };

        let departments: Vec<&StoredDepartment> = working
            .departments
            .iter()
            .filter(|d| d.hospital_id == hospital_id)
            .collect();

        for (index, department) in departments.iter().enumerate() {
            if index > 0 {
                self.politeness.wait().await;
            }
            match self
                .scan_tracked_department(adapter.as_ref(), hospital_id, department, working)
                .await
            {
                Ok(found) => {
                    scan.departments += 1;
                    scan.slots += found.rows.len();
                    scan.live_fetches += found.live_fetches;
                    for error in found.skipped {
                        scan.skip(error);
                    }
                    scan.writes.merge(self.writer.write(found.rows).await);
                }
                Err(e) => {
                    crate::log_unit_skipped!("department", department.code, e);
                    scan.skip(format!("department {}: {e}", department.code));
                }
            }
        }

        crate::log_scan_complete!(
            ScanMode::Tracked,
            code,
            scan.writes.rows_written,
            started.elapsed()
        );
        scan
    }

    async fn scan_tracked_department(
        &self,
        adapter: &dyn HospitalAdapter,
        hospital_id: HospitalId,
        department: &StoredDepartment,
        working: &WorkingSet,
    ) -> Result<DepartmentRows> {
        let slots = adapter.fetch_schedule(&department.code).await?;

        let mut doctor_cache: HashMap<String, DoctorId> = self
            .store
            .doctors_in_department(department.id)
            .await?
            .into_iter()
            .map(|d| (d.doctor_no, d.id))
            .collect();

        let mut found = DepartmentRows::default();
        let mut progress_cache = ProgressCache::new();
        let scheduled: HashSet<String> = slots.iter().map(|s| s.doctor_no.clone()).collect();

        self.collect_tracked_rows(
            adapter,
            hospital_id,
            department.id,
            &slots,
            working,
            &mut doctor_cache,
            &mut progress_cache,
            &mut found,
        )
        .await;

        // Tracked doctors that dropped out of the department listing
        let drifted: Vec<&StoredDoctor> = working
            .tracked_doctors
            .iter()
            .filter(|d| d.department_id == department.id && !scheduled.contains(&d.doctor_no))
            .collect();
        for doctor in drifted {
            tracing::info!(
                department = %department.code,
                doctor = %doctor.doctor_no,
                "Tracked doctor missing from schedule, fetching directly"
            );
            match adapter
                .fetch_doctor_schedule(&doctor.doctor_no, &doctor.name, &department.code)
                .await
            {
                Ok(slots) => {
                    self.collect_tracked_rows(
                        adapter,
                        hospital_id,
                        department.id,
                        &slots,
                        working,
                        &mut doctor_cache,
                        &mut progress_cache,
                        &mut found,
                    )
                    .await;
                }
                Err(e) => {
                    crate::log_unit_skipped!("doctor", doctor.doctor_no, e);
                    found.skipped.push(format!("doctor {}: {e}", doctor.doctor_no));
                }
            }
        }

        Ok(found)
    }

    #[allow(clippy::too_many_arguments)]
    async fn collect_tracked_rows(
        &self,
        adapter: &dyn HospitalAdapter,
        hospital_id: HospitalId,
        department_id: DepartmentId,
        slots: &[DoctorSlot],
        working: &WorkingSet,
        doctor_cache: &mut HashMap<String, DoctorId>,
        progress_cache: &mut ProgressCache,
        found: &mut DepartmentRows,
    ) {
        let now = self.clock.now();
        let scraped_at = now.with_timezone(&Utc);

        for slot in slots {
            let doctor_id = match self
                .doctor_id_for(hospital_id, department_id, slot, doctor_cache)
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    crate::log_unit_skipped!("doctor", slot.doctor_no, e);
                    found.skipped.push(format!("doctor {}: {e}", slot.doctor_no));
                    continue;
                }
            };

            let mut row = SnapshotRow::from_slot(doctor_id, department_id, slot, scraped_at);

            let live_due = working.needs_progress(department_id, doctor_id)
                && !slot.clinic_room.is_empty()
                && self.gate.is_due(slot.session_date, slot.session_type, now);
            if live_due {
                match self
                    .cached_progress(adapter, &slot.clinic_room, slot.session_type, progress_cache)
                    .await
                {
                    Ok(Some(progress)) => {
                        row.apply_progress(&progress);
                        found.live_fetches += 1;
                    }
                    Ok(None) => {
                        tracing::debug!(room = %slot.clinic_room, "No live progress published");
                    }
                    Err(e) => {
                        crate::log_unit_skipped!("clinic room", slot.clinic_room, e);
                        found
                            .skipped
                            .push(format!("room {}: {e}", slot.clinic_room));
                    }
                }
            }

            found.rows.push(row);
        }
    }

    /// Progress for a room, fetched at most once per cycle unit
    async fn cached_progress(
        &self,
        adapter: &dyn HospitalAdapter,
        clinic_room: &str,
        session_type: SessionType,
        cache: &mut ProgressCache,
    ) -> Result<Option<ClinicProgress>> {
        let key = (clinic_room.to_string(), session_type);
        if let Some(progress) = cache.get(&key) {
            return Ok(progress.clone());
        }
        let progress = adapter
            .fetch_clinic_progress(clinic_room, session_type)
            .await?;
        cache.insert(key, progress.clone());
        Ok(progress)
    }

    async fn morning_sync_hospital(
        &self,
        adapter: Arc<dyn HospitalAdapter>,
        sessions: &[(DoctorId, SessionType)],
        hospital_of: &HashMap<DoctorId, HospitalId>,
    ) -> HospitalScan {
        let started = Instant::now();
        let code = adapter.hospital_code().to_string();
        crate::log_scan_start!(ScanMode::MorningSync, code);
        let mut scan = HospitalScan::new(&code);

        let Some(hospital_id) = self.resolve_hospital(&mut scan).await else {
            return scan;
        };

        let today = self.clock.today();
        let scraped_at = self.clock.now().with_timezone(&Utc);
        let mut progress_cache = ProgressCache::new();
        let mut rows = Vec::new();

        for (doctor_id, session_type) in sessions
            .iter()
            .filter(|(doctor_id, _)| hospital_of.get(doctor_id) == Some(&hospital_id))
        {
            let snapshot = match self
                .store
                .latest_snapshot(*doctor_id, today, *session_type)
                .await
            {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => {
                    tracing::debug!(doctor = %doctor_id.short(), "No snapshot for today yet");
                    continue;
                }
                Err(e) => {
                    crate::log_unit_skipped!("doctor", doctor_id.short(), e);
                    scan.skip(format!("snapshot {}: {e}", doctor_id.short()));
                    continue;
                }
            };
            if snapshot.clinic_room.is_empty() {
                continue;
            }

            match self
                .cached_progress(
                    adapter.as_ref(),
                    &snapshot.clinic_room,
                    *session_type,
                    &mut progress_cache,
                )
                .await
            {
                Ok(Some(progress)) => {
                    let mut row = snapshot;
                    row.apply_progress(&progress);
                    row.scraped_at = scraped_at;
                    scan.live_fetches += 1;
                    rows.push(row);
                }
                Ok(None) => {}
                Err(e) => {
                    crate::log_unit_skipped!("clinic room", snapshot.clinic_room, e);
                    scan.skip(format!("room {}: {e}", snapshot.clinic_room));
                }
            }
        }

        scan.slots = rows.len();
        scan.writes = self.writer.write(rows).await;
        crate::log_scan_complete!(
            ScanMode::MorningSync,
            code,
            scan.writes.rows_written,
            started.elapsed()
        );
        scan
    }

    async fn notify(&self, summary: &mut ScanSummary) {
        let Some(engine) = &self.notifier else {
            return;
        };
        if self.writer.is_dry_run() {
            tracing::info!("Dry run, skipping notifications");
            return;
        }
        match engine.run().await {
            Ok(result) => {
                summary.alerts_fired = result.alerts_fired;
                summary.errors.extend(result.errors);
            }
            Err(e) => {
                tracing::error!(error = %e, "Notification run failed");
                summary.errors.push(format!("notifications: {e}"));
            }
        }
    }

    fn finish(&self, mut summary: ScanSummary, started: Instant) -> ScanSummary {
        summary.duration = started.elapsed();
        tracing::info!(
            mode = %summary.mode,
            hospitals = summary.hospitals.len(),
            rows = summary.rows_written(),
            alerts = summary.alerts_fired,
            errors = summary.all_errors().len(),
            duration_ms = summary.duration.as_millis() as u64,
            "Scan cycle finished"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_politeness_range() {
        let delay = PolitenessDelay::new(500, 1500);
        for _ in 0..50 {
            let picked = delay.pick();
            assert!(picked >= Duration::from_millis(500));
            assert!(picked <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_politeness_none_and_swapped_bounds() {
        assert_eq!(PolitenessDelay::none().pick(), Duration::ZERO);
        assert_eq!(PolitenessDelay::new(20, 10), PolitenessDelay::new(10, 20));
    }

    #[test]
    fn test_working_set_progress_rule() {
        let (doctor, other_doctor) = (DoctorId::generate(), DoctorId::generate());
        let (department, other_department) = (DepartmentId::generate(), DepartmentId::generate());
        let mut working = WorkingSet::default();
        working.doctors.insert(doctor);
        working.explicit_departments.insert(department);

        assert!(working.needs_progress(department, other_doctor));
        assert!(working.needs_progress(other_department, doctor));
        assert!(!working.needs_progress(other_department, other_doctor));
    }
}
