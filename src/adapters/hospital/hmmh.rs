//! Hsinchu MacKay Memorial Hospital adapter
//!
//! - `find_division.php` lists departments as `depid=` links
//! - `register_divide.php?depid={code}` renders a week grid of doctor links
//! - `progressstatus.php?dept={code}&ap={1|2|3}` renders the live ticket table
//!
//! Progress is published per department rather than per room, so the
//! department code doubles as the clinic room.

use super::dates::find_dates;
use super::html::HtmlScanner;
use super::http::{join_url, with_query, ScraperHttp};
use super::HospitalAdapter;
use crate::config::{HospitalConfig, ScraperConfig};
use crate::domain::{
    ClinicProgress, ClinicState, DepartmentRecord, DoctorSlot, QueueEntry, QueueWatchError,
    Result, SessionType,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;

const REFERER: &str = "https://www.hc.mmh.org.tw/";
const PROGRESS_TABLE_CLASSES: [&str; 2] = ["regtable", "resp-table"];
const DEFAULT_CATEGORY: &str = "其他專科";

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "內科系",
        &[
            "一般內科",
            "神經內科",
            "心臟內科",
            "心臟血管內科",
            "胸腔內科",
            "腸胃肝膽內科",
            "消化內科",
            "腎臟內科",
            "風濕免疫科",
            "過敏免疫風濕科",
            "新陳代謝科",
            "內分泌新陳代謝科",
            "感染科",
            "家庭醫學科",
            "精神科",
            "血液腫瘤科",
        ],
    ),
    (
        "外科系",
        &[
            "一般外科",
            "神經外科",
            "心臟血管外科",
            "胸腔外科",
            "大腸直腸外科",
            "整形外科",
            "美容門診",
            "泌尿科",
            "骨科",
            "乳房外科",
            "減重暨代謝手術門診",
            "外傷科",
        ],
    ),
    ("婦兒科系", &["婦產科", "兒科"]),
    (
        "其他專科",
        &["眼科", "耳鼻喉科", "牙科", "復健科", "皮膚科", "中醫科", "放射腫瘤科"],
    ),
];

/// Department grouping by exact display name
pub fn categorize_department(name: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(_, names)| names.contains(&name))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// Adapter for HMMH
pub struct HmmhAdapter {
    code: String,
    base_url: String,
    http: ScraperHttp,
    scanner: HtmlScanner,
    department: Regex,
    doctor: Regex,
}

impl HmmhAdapter {
    /// Create an adapter for one configured HMMH site
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(hospital: &HospitalConfig, scraper: &ScraperConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                QueueWatchError::Configuration(format!("Invalid HMMH pattern {pattern}: {e}"))
            })
        };
        Ok(Self {
            code: hospital.code.clone(),
            base_url: hospital.base_url.trim_end_matches('/').to_string(),
            http: ScraperHttp::new(scraper, REFERER)?,
            scanner: HtmlScanner::new()?,
            department: compile(r"depid=(\d+)")?,
            doctor: compile(r"drcode=([A-Za-z0-9]+)")?,
        })
    }

    fn parse_departments(&self, html: &str) -> Vec<DepartmentRecord> {
        let mut seen = HashSet::new();
        self.scanner
            .links(html)
            .into_iter()
            .filter_map(|link| {
                let code = self.department.captures(&link.href)?[1].to_string();
                if link.text.chars().count() < 2 {
                    return None;
                }
                if link.href.contains("/child/") {
                    tracing::debug!(department = %link.text, "Skipping children's hospital department");
                    return None;
                }
                if link.href.contains("register_single_doctor.php") {
                    tracing::debug!(department = %link.text, "Skipping single-doctor clinic");
                    return None;
                }
                seen.insert(code.clone()).then_some((code, link.text))
            })
            .enumerate()
            .map(|(i, (code, name))| {
                let category = categorize_department(&name);
                DepartmentRecord::new(&self.code, code, name)
                    .with_category(category)
                    .with_sort_order(i as i32 + 1)
            })
            .collect()
    }

    /// Best-effort week grid parse.
    ///
    /// The first row carrying dates fixes the column dates; each later row
    /// opens with a session label and holds doctor links under those dates.
    fn parse_schedule(&self, html: &str, department_code: &str) -> Vec<DoctorSlot> {
        let mut column_dates: Option<Vec<Option<NaiveDate>>> = None;
        let mut seen = HashSet::new();
        let mut slots = Vec::new();

        for row in self.scanner.rows(html) {
            let cells = self.scanner.cells(row);

            if column_dates.is_none() {
                let header: Vec<Option<NaiveDate>> = cells
                    .iter()
                    .map(|cell| find_dates(&self.scanner.text(cell)).first().map(|m| m.date))
                    .collect();
                if header.iter().any(Option::is_some) {
                    column_dates = Some(header);
                }
                continue;
            }
            let Some(dates) = column_dates.as_ref() else {
                continue;
            };

            let Some((label, _)) = cells.split_first() else {
                continue;
            };
            let Some(session_type) = SessionType::from_label(&self.scanner.text(label)) else {
                continue;
            };

            for (index, cell) in cells.iter().enumerate().skip(1) {
                let Some(Some(session_date)) = dates.get(index).copied() else {
                    continue;
                };
                let is_full = cell.contains("額滿");

                for link in self.scanner.links(cell) {
                    let Some(caps) = self.doctor.captures(&link.href) else {
                        continue;
                    };
                    let doctor_no = caps[1].to_string();
                    if link.text.is_empty()
                        || !seen.insert((doctor_no.clone(), session_date, session_type))
                    {
                        continue;
                    }

                    let mut slot = DoctorSlot::new(
                        doctor_no,
                        &link.text,
                        department_code,
                        session_date,
                        session_type,
                    );
                    slot.clinic_room = department_code.to_string();
                    slot.is_full = is_full;
                    if is_full {
                        slot.status = Some("額滿".to_string());
                    }
                    slots.push(slot);
                }
            }
        }

        slots
    }

    fn parse_progress(
        &self,
        html: &str,
        clinic_room: &str,
        session_type: SessionType,
    ) -> Option<ClinicProgress> {
        let tables = self.scanner.tables_with_class(html, &PROGRESS_TABLE_CLASSES);
        if tables.is_empty() {
            tracing::warn!(hospital = %self.code, room = %clinic_room, "No progress table found");
            return None;
        }

        let status = ClinicState::detect(&self.scanner.text(html)).map(|s| s.label().to_string());

        let entries: Vec<QueueEntry> = tables
            .iter()
            .flat_map(|table| self.scanner.rows(table))
            .filter_map(|row| {
                let cells = self.scanner.data_cells(row);
                if cells.len() < 2 {
                    return None;
                }
                let number_text = self.scanner.text(cells[0]);
                if number_text.is_empty() || !number_text.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                Some(QueueEntry {
                    number: number_text.parse().ok()?,
                    status: self.scanner.text(cells[1]),
                })
            })
            .collect();

        let current = entries
            .iter()
            .rev()
            .find(|e| e.status.contains("看診中"))
            .or_else(|| entries.iter().rev().find(|e| !e.status.contains("未看診")))
            .map(|e| e.number);

        if current.is_none() && status.is_none() && entries.is_empty() {
            return None;
        }

        let waiting_list: Vec<i32> = entries
            .iter()
            .filter(|e| e.status.contains("未看診") || e.status.contains("等候"))
            .map(|e| e.number)
            .collect();

        Some(ClinicProgress {
            clinic_room: clinic_room.to_string(),
            session_type,
            current_number: current.unwrap_or(0),
            total_quota: Some(entries.iter().map(|e| e.number).max().unwrap_or(0)),
            registered: Some(entries.len() as i32),
            status,
            waiting_list: Some(waiting_list),
            queue_details: Some(entries),
        })
    }
}

#[async_trait]
impl HospitalAdapter for HmmhAdapter {
    fn hospital_code(&self) -> &str {
        &self.code
    }

    async fn fetch_departments(&self) -> Result<Vec<DepartmentRecord>> {
        let html = self
            .http
            .get_text(&join_url(&self.base_url, "find_division.php"))
            .await?;
        let departments = self.parse_departments(&html);

        tracing::info!(hospital = %self.code, count = departments.len(), "Found departments");
        Ok(departments)
    }

    async fn fetch_schedule(&self, department_code: &str) -> Result<Vec<DoctorSlot>> {
        let url = with_query(
            &join_url(&self.base_url, "register_divide.php"),
            &[("depid", department_code)],
        )?;
        let html = self.http.get_text(&url).await?;
        let slots = self.parse_schedule(&html, department_code);

        if slots.is_empty() {
            tracing::debug!(hospital = %self.code, department = %department_code, "No slots parsed from schedule grid");
        }
        Ok(slots)
    }

    async fn fetch_clinic_progress(
        &self,
        clinic_room: &str,
        session_type: SessionType,
    ) -> Result<Option<ClinicProgress>> {
        let url = with_query(
            &join_url(&self.base_url, "progressstatus.php"),
            &[("dept", clinic_room), ("ap", session_type.period_code())],
        )?;
        let html = self.http.get_text(&url).await?;
        let progress = self.parse_progress(&html, clinic_room, session_type);

        if let Some(ref p) = progress {
            tracing::debug!(
                hospital = %self.code,
                room = %clinic_room,
                current = p.current_number,
                registered = ?p.registered,
                status = ?p.status,
                "Parsed clinic progress"
            );
        }
        Ok(progress)
    }
}
