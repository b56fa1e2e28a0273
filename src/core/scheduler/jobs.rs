//! Cron jobs driving the scan cycles
//!
//! All expressions carry a seconds field and are evaluated in Taiwan time.

use crate::config::{parse_hour_range, ScheduleConfig};
use crate::core::ingest::{IngestOrchestrator, ScanMode};
use crate::core::scheduler::guard::JobGuard;
use crate::domain::{taiwan_offset, QueueWatchError, Result};
use chrono::Timelike;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Cron expressions for the three cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronPlan {
    /// Hourly full scan inside the off-peak window
    pub full_scan: String,
    /// Tracked scan every `interval_minutes` inside the daytime window
    pub tracked_scan: String,
    /// Once a day
    pub morning_sync: String,
}

impl CronPlan {
    /// Build expressions from the schedule section
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed hour range or sync time.
    pub fn from_config(schedule: &ScheduleConfig) -> Result<Self> {
        let (full_start, full_end) =
            parse_hour_range(&schedule.full_scan_hours).map_err(QueueWatchError::Configuration)?;
        let (tracked_start, tracked_end) = parse_hour_range(&schedule.tracked_scan_hours)
            .map_err(QueueWatchError::Configuration)?;
        let sync = schedule
            .morning_sync()
            .map_err(QueueWatchError::Configuration)?;

        Ok(Self {
            full_scan: format!("0 0 {} * * *", hour_field(full_start, full_end)),
            tracked_scan: format!(
                "0 */{} {} * * *",
                schedule.interval_minutes,
                hour_field(tracked_start, tracked_end)
            ),
            morning_sync: format!("0 {} {} * * *", sync.minute(), sync.hour()),
        })
    }

    fn entries(&self) -> [(ScanMode, &str); 3] {
        [
            (ScanMode::Full, self.full_scan.as_str()),
            (ScanMode::Tracked, self.tracked_scan.as_str()),
            (ScanMode::MorningSync, self.morning_sync.as_str()),
        ]
    }
}

fn hour_field(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}-{end}")
    }
}

fn job_name(mode: ScanMode) -> &'static str {
    match mode {
        ScanMode::Full => "full-scan",
        ScanMode::Tracked => "tracked-scan",
        ScanMode::MorningSync => "morning-sync",
    }
}

/// Running cron scheduler bound to one orchestrator
pub struct ScanScheduler {
    scheduler: JobScheduler,
}

impl ScanScheduler {
    /// Register the three jobs and start ticking
    ///
    /// # Errors
    ///
    /// Returns a scheduler error if a job cannot be created or the
    /// scheduler fails to start.
    pub async fn start(orchestrator: Arc<IngestOrchestrator>, plan: &CronPlan) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| QueueWatchError::Scheduler(format!("Failed to create scheduler: {e}")))?;

        for (mode, cron) in plan.entries() {
            let job = scan_job(orchestrator.clone(), mode, cron)?;
            scheduler.add(job).await.map_err(|e| {
                QueueWatchError::Scheduler(format!("Failed to add {} job: {e}", job_name(mode)))
            })?;
            tracing::info!(job = job_name(mode), cron = %cron, "Job scheduled");
        }

        scheduler
            .start()
            .await
            .map_err(|e| QueueWatchError::Scheduler(format!("Failed to start scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Stop ticking; runs already in flight are not awaited
    ///
    /// # Errors
    ///
    /// Returns a scheduler error if shutdown fails.
    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| QueueWatchError::Scheduler(format!("Failed to stop scheduler: {e}")))
    }
}

fn scan_job(orchestrator: Arc<IngestOrchestrator>, mode: ScanMode, cron: &str) -> Result<Job> {
    let guard = Arc::new(JobGuard::new(job_name(mode)));

    Job::new_async_tz(cron, taiwan_offset(), move |_id, _scheduler| {
        let orchestrator = orchestrator.clone();
        let guard = guard.clone();
        Box::pin(async move {
            let Some(_permit) = guard.try_acquire() else {
                tracing::warn!(job = guard.name(), "Previous run still in progress, skipping tick");
                return;
            };
            let summary = orchestrator.run(mode, None).await;
            if summary.has_errors() {
                tracing::warn!(
                    job = guard.name(),
                    errors = summary.all_errors().len(),
                    "Scheduled run finished with errors"
                );
            }
        })
    })
    .map_err(|e| {
        QueueWatchError::Scheduler(format!(
            "Invalid cron '{cron}' for {}: {e}",
            job_name(mode)
        ))
    })
}

/// Run the scheduler until the shutdown signal flips, then close adapters
///
/// # Errors
///
/// Returns a scheduler error if the scheduler cannot start or stop.
pub async fn run_until_shutdown(
    orchestrator: Arc<IngestOrchestrator>,
    plan: &CronPlan,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let scheduler = ScanScheduler::start(orchestrator.clone(), plan).await?;
    tracing::info!("Scheduler running");

    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }

    tracing::info!("Shutdown requested, stopping scheduler");
    scheduler.shutdown().await?;
    orchestrator.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan() {
        let plan = CronPlan::from_config(&ScheduleConfig::default()).unwrap();
        assert_eq!(plan.full_scan, "0 0 0-5 * * *");
        assert_eq!(plan.tracked_scan, "0 */5 6-23 * * *");
        assert_eq!(plan.morning_sync, "0 0 8 * * *");
    }

    #[test]
    fn test_single_hour_window() {
        let schedule = ScheduleConfig {
            full_scan_hours: "3".to_string(),
            interval_minutes: 10,
            morning_sync_time: "07:45".to_string(),
            ..ScheduleConfig::default()
        };
        let plan = CronPlan::from_config(&schedule).unwrap();
        assert_eq!(plan.full_scan, "0 0 3 * * *");
        assert_eq!(plan.tracked_scan, "0 */10 6-23 * * *");
        assert_eq!(plan.morning_sync, "0 45 7 * * *");
    }

    #[test]
    fn test_bad_hours_rejected() {
        let schedule = ScheduleConfig {
            tracked_scan_hours: "22-6".to_string(),
            ..ScheduleConfig::default()
        };
        assert!(matches!(
            CronPlan::from_config(&schedule),
            Err(QueueWatchError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_expressions_parse() {
        let plan = CronPlan::from_config(&ScheduleConfig::default()).unwrap();
        for (_, cron) in plan.entries() {
            let job = Job::new_async_tz(cron, taiwan_offset(), |_id, _scheduler| {
                Box::pin(async {})
            });
            assert!(job.is_ok(), "cron '{cron}' should parse");
        }
    }
}
