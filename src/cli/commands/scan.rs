//! Scan command implementation
//!
//! Runs one full scan, tracked scan or morning sync immediately.

use crate::config::load_config;
use crate::core::ingest::{IngestOrchestrator, ScanMode, ScanSummary};
use clap::{Args, ValueEnum};

/// Cycle selectable on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanModeArg {
    /// Every department, schedule only
    Full,
    /// Tracked departments with live progress, then notifications
    Tracked,
    /// Live refresh of today's subscriptions, then notifications
    MorningSync,
}

impl From<ScanModeArg> for ScanMode {
    fn from(mode: ScanModeArg) -> Self {
        match mode {
            ScanModeArg::Full => ScanMode::Full,
            ScanModeArg::Tracked => ScanMode::Tracked,
            ScanModeArg::MorningSync => ScanMode::MorningSync,
        }
    }
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Cycle to run
    #[arg(long, value_enum)]
    pub mode: ScanModeArg,

    /// Restrict to one hospital code
    #[arg(long)]
    pub hospital: Option<String>,

    /// Scrape but do not write snapshots or send alerts
    #[arg(long)]
    pub dry_run: bool,
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mode = ScanMode::from(self.mode);
        tracing::info!(mode = %mode, hospital = ?self.hospital, "Starting manual scan");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let orchestrator = match IngestOrchestrator::from_config(&config, self.dry_run) {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build orchestrator");
                eprintln!("Failed to initialize: {e}");
                return Ok(2);
            }
        };

        if self.dry_run {
            println!("🔍 DRY RUN MODE - No snapshots will be written and no alerts sent");
            println!();
        }

        println!("🚀 Starting {mode} scan...");
        let summary = orchestrator.run(mode, self.hospital.as_deref()).await;
        orchestrator.close().await;

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

fn print_summary(summary: &ScanSummary) {
    println!();
    println!("📊 Scan Summary ({}):", summary.mode);
    for hospital in &summary.hospitals {
        println!(
            "  {}: {} departments, {} slots, {} live, {} rows written, {} skipped",
            hospital.hospital,
            hospital.departments,
            hospital.slots,
            hospital.live_fetches,
            hospital.writes.rows_written,
            hospital.skipped_units
        );
    }
    println!("  Alerts fired: {}", summary.alerts_fired);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

    let errors = summary.all_errors();
    if !errors.is_empty() {
        println!();
        println!("⚠️  Errors encountered:");
        for error in errors.iter().take(20) {
            println!("  - {error}");
        }
        if errors.len() > 20 {
            println!("  ... and {} more", errors.len() - 20);
        }
    }
    println!();
}

/// 0 when clean, 1 when anything was skipped or failed
fn exit_code(summary: &ScanSummary) -> i32 {
    if summary.has_errors() {
        println!("⚠️  Scan completed with failures");
        1
    } else {
        println!("✅ Scan completed successfully!");
        0
    }
}
