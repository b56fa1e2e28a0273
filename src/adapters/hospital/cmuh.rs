//! China Medical University Hospital adapter
//!
//! - `AppointmentByDivision?flag=first` lists departments as `table=` links
//! - `DymSchedule?table={code}&flag=first` lists doctors as `DocNo=` links
//! - the registration CGI (`reg52.cgi`, Big5) renders one doctor's grid
//! - `ClinicQuery` answers a POST with the current call number of a room

use super::dates::{first_int, split_date_blocks};
use super::fanout::fan_out_bounded;
use super::html::HtmlScanner;
use super::http::{join_url, with_query, ScraperHttp, BIG5};
use super::HospitalAdapter;
use crate::config::{HospitalConfig, ScraperConfig};
use crate::domain::{
    ClinicProgress, ClinicState, DepartmentRecord, DoctorSlot, QueueWatchError, Result,
    SessionType,
};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;

const REFERER: &str = "https://www.cmuh.cmu.edu.tw/";
const DEFAULT_DETAIL_URL: &str = "https://appointment.cmuh.org.tw/cgi-bin/reg52.cgi";
const FULL_STATUS: &str = "額滿";

#[derive(Debug, Clone)]
struct CmuhPatterns {
    department: Regex,
    doctor: Regex,
    registered: Regex,
    room: Regex,
    current_labelled: Regex,
    current_suffixed: Regex,
}

impl CmuhPatterns {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                QueueWatchError::Configuration(format!("Invalid CMUH pattern {pattern}: {e}"))
            })
        };
        Ok(Self {
            department: compile(r"table=([A-Za-z0-9_]+)")?,
            doctor: compile(r"DocNo=([A-Za-z0-9]+)")?,
            registered: compile(r"已掛號[：:]\s*(\d+)")?,
            room: compile(r"\((\d+)\s*診?\)")?,
            current_labelled: compile(r"目前看診號[：:]\s*(\d+)")?,
            current_suffixed: compile(r"(\d+)\s*號")?,
        })
    }
}

/// Adapter for CMUH
pub struct CmuhAdapter {
    code: String,
    base_url: String,
    detail_url: String,
    detail_concurrency: usize,
    http: ScraperHttp,
    scanner: HtmlScanner,
    patterns: CmuhPatterns,
}

impl CmuhAdapter {
    /// Create an adapter for one configured CMUH site
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(hospital: &HospitalConfig, scraper: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            code: hospital.code.clone(),
            base_url: hospital.base_url.trim_end_matches('/').to_string(),
            detail_url: hospital
                .detail_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DETAIL_URL.to_string()),
            detail_concurrency: scraper.detail_concurrency,
            http: ScraperHttp::new(scraper, REFERER)?,
            scanner: HtmlScanner::new()?,
            patterns: CmuhPatterns::new()?,
        })
    }

    fn parse_departments(&self, html: &str) -> Vec<DepartmentRecord> {
        let mut seen = HashSet::new();
        self.scanner
            .links(html)
            .into_iter()
            .filter_map(|link| {
                let code = self.patterns.department.captures(&link.href)?[1].to_string();
                if link.text.is_empty() || !seen.insert(code.clone()) {
                    return None;
                }
                Some((code, link.text))
            })
            .enumerate()
            .map(|(i, (code, name))| {
                DepartmentRecord::new(&self.code, code, name).with_sort_order(i as i32 + 1)
            })
            .collect()
    }

    /// `(doctor_no, raw_name)` pairs in page order, first occurrence wins
    fn parse_doctor_links(&self, html: &str) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        self.scanner
            .links(html)
            .into_iter()
            .filter_map(|link| {
                let doctor_no = self.patterns.doctor.captures(&link.href)?[1].to_string();
                if link.text.is_empty() || !seen.insert(doctor_no.clone()) {
                    return None;
                }
                Some((doctor_no, link.text))
            })
            .collect()
    }

    /// Parse a doctor's registration grid.
    ///
    /// Rows start with a session label; every other cell may hold several
    /// date blocks, one slot each.
    fn parse_doctor_grid(
        &self,
        html: &str,
        doctor_no: &str,
        doctor_name: &str,
        department_code: &str,
    ) -> Vec<DoctorSlot> {
        let mut slots = Vec::new();

        for row in self.scanner.rows(html) {
            let cells = self.scanner.cells(row);
            let Some((label, days)) = cells.split_first() else {
                continue;
            };
            let Some(session_type) = SessionType::from_label(&self.scanner.text(label)) else {
                continue;
            };

            for cell in days {
                let text = self.scanner.text(cell);
                for (session_date, block) in split_date_blocks(&text) {
                    let mut slot = DoctorSlot::new(
                        doctor_no,
                        doctor_name,
                        department_code,
                        session_date,
                        session_type,
                    );
                    slot.registered = self
                        .patterns
                        .registered
                        .captures(block)
                        .and_then(|caps| caps[1].parse().ok());
                    slot.clinic_room = self.longest_room(block).unwrap_or_default();
                    slot.is_full = block.contains("額滿") || block.contains("掛滿");
                    if slot.is_full {
                        slot.status = Some(FULL_STATUS.to_string());
                    }
                    slots.push(slot);
                }
            }
        }

        slots
    }

    /// Longest parenthesised number in a block; the first wins a tie
    fn longest_room(&self, block: &str) -> Option<String> {
        self.patterns
            .room
            .captures_iter(block)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .fold(None, |best: Option<&str>, room| match best {
                Some(b) if b.len() >= room.len() => Some(b),
                _ => Some(room),
            })
            .map(str::to_string)
    }

    fn parse_progress(
        &self,
        html: &str,
        clinic_room: &str,
        session_type: SessionType,
    ) -> Option<ClinicProgress> {
        let text = self.scanner.text(html);

        let current = self
            .patterns
            .current_labelled
            .captures(&text)
            .or_else(|| self.patterns.current_suffixed.captures(&text))
            .and_then(|caps| caps[1].parse::<i32>().ok())
            .or_else(|| {
                self.scanner
                    .elements_with_class(html, &["result", "number", "current"])
                    .into_iter()
                    .find_map(|fragment| first_int(&self.scanner.text(fragment)))
            })?;

        let mut progress = ClinicProgress::current_only(clinic_room, session_type, current);
        progress.status = ClinicState::detect(&text).map(|s| s.label().to_string());
        Some(progress)
    }
}

#[async_trait]
impl HospitalAdapter for CmuhAdapter {
    fn hospital_code(&self) -> &str {
        &self.code
    }

    async fn fetch_departments(&self) -> Result<Vec<DepartmentRecord>> {
        let url = with_query(
            &join_url(&self.base_url, "OnlineAppointment/AppointmentByDivision"),
            &[("flag", "first")],
        )?;
        let html = self.http.get_text(&url).await?;
        let departments = self.parse_departments(&html);

        tracing::debug!(hospital = %self.code, count = departments.len(), "Parsed departments");
        Ok(departments)
    }

    async fn fetch_schedule(&self, department_code: &str) -> Result<Vec<DoctorSlot>> {
        let url = with_query(
            &join_url(&self.base_url, "OnlineAppointment/DymSchedule"),
            &[("table", department_code), ("flag", "first")],
        )?;
        let html = self.http.get_text(&url).await?;
        let doctors = self.parse_doctor_links(&html);

        tracing::debug!(
            hospital = %self.code,
            department = %department_code,
            doctors = doctors.len(),
            "Fetching doctor grids"
        );

        let results = fan_out_bounded(doctors, self.detail_concurrency, |(no, name)| async move {
            let outcome = self.fetch_doctor_schedule(&no, &name, department_code).await;
            (no, outcome)
        })
        .await;

        let mut slots = Vec::new();
        for (doctor_no, outcome) in results {
            match outcome {
                Ok(found) => slots.extend(found),
                Err(e) => {
                    crate::log_unit_skipped!("doctor", doctor_no, e);
                }
            }
        }
        Ok(slots)
    }

    async fn fetch_clinic_progress(
        &self,
        clinic_room: &str,
        session_type: SessionType,
    ) -> Result<Option<ClinicProgress>> {
        let url = join_url(&self.base_url, "OnlineAppointment/ClinicQuery");
        let html = self
            .http
            .post_form(
                &url,
                &[
                    ("ClinicRoom", clinic_room),
                    ("TimePeriod", session_type.period_code()),
                ],
            )
            .await?;

        Ok(self.parse_progress(&html, clinic_room, session_type))
    }

    async fn fetch_doctor_schedule(
        &self,
        doctor_no: &str,
        doctor_name: &str,
        department_code: &str,
    ) -> Result<Vec<DoctorSlot>> {
        let backend_no = if doctor_no.starts_with('D') {
            doctor_no.to_string()
        } else {
            format!("D{doctor_no}")
        };
        let url = with_query(
            &self.detail_url,
            &[("DocNo", backend_no.as_str()), ("Docname", doctor_name)],
        )?;
        let html = self.http.get_text_with_charset(&url, BIG5).await?;

        Ok(self.parse_doctor_grid(&html, doctor_no, doctor_name, department_code))
    }

    fn accepts_department(&self, department: &DepartmentRecord) -> bool {
        !department.code.contains('_')
    }
}
