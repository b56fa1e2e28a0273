//! Hospital adapter trait definition
//!
//! One implementation per hospital site. Each turns that site's pages into
//! typed records; the orchestrator never sees HTML.

use crate::domain::{ClinicProgress, DepartmentRecord, DoctorSlot, Result, SessionType};
use async_trait::async_trait;

/// Capability interface implemented once per hospital
///
/// Every fetch fails with a typed [`crate::domain::ScrapeError`] wrapped in
/// [`crate::domain::QueueWatchError`]; transient network failures have
/// already been retried by the time an error reaches the caller.
///
/// # Example
///
/// ```no_run
/// use queuewatch::adapters::hospital::{create_hospital_adapter, HospitalAdapter};
/// use queuewatch::config::{HospitalConfig, ScraperConfig};
///
/// # async fn example() -> queuewatch::domain::Result<()> {
/// let hospital = HospitalConfig {
///     code: "HMMH".to_string(),
///     adapter: "hmmh".to_string(),
///     base_url: "https://www.hc.mmh.org.tw".to_string(),
///     detail_url: None,
///     enabled: true,
/// };
/// let adapter = create_hospital_adapter(&hospital, &ScraperConfig::default())?;
///
/// for department in adapter.fetch_departments().await? {
///     let slots = adapter.fetch_schedule(&department.code).await?;
///     println!("{}: {} slots", department.name, slots.len());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait HospitalAdapter: Send + Sync {
    /// Hospital code this adapter scrapes
    fn hospital_code(&self) -> &str;

    /// List the departments offered for online registration
    async fn fetch_departments(&self) -> Result<Vec<DepartmentRecord>>;

    /// Every doctor slot currently published for a department
    async fn fetch_schedule(&self, department_code: &str) -> Result<Vec<DoctorSlot>>;

    /// Live queue state of one clinic room, or `None` if the site has none
    async fn fetch_clinic_progress(
        &self,
        clinic_room: &str,
        session_type: SessionType,
    ) -> Result<Option<ClinicProgress>>;

    /// Slots for one doctor fetched directly, used when a tracked doctor has
    /// drifted out of the department listing
    async fn fetch_doctor_schedule(
        &self,
        _doctor_no: &str,
        _doctor_name: &str,
        _department_code: &str,
    ) -> Result<Vec<DoctorSlot>> {
        Ok(Vec::new())
    }

    /// Whether a listed department should be scraped at all
    fn accepts_department(&self, _department: &DepartmentRecord) -> bool {
        true
    }

    /// Release held resources
    async fn close(&self) {
        tracing::debug!(hospital = %self.hospital_code(), "Adapter closed");
    }
}
