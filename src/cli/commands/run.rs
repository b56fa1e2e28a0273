//! Run command implementation
//!
//! Starts the cron scheduler and keeps it running until SIGINT or SIGTERM.

use crate::config::load_config;
use crate::core::ingest::IngestOrchestrator;
use crate::core::scheduler::{run_until_shutdown, CronPlan};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scrape but do not write snapshots or send alerts
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let plan = match CronPlan::from_config(&config.schedule) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let orchestrator = match IngestOrchestrator::from_config(&config, self.dry_run) {
            Ok(orchestrator) => Arc::new(orchestrator),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build orchestrator");
                eprintln!("Failed to initialize: {e}");
                return Ok(2);
            }
        };

        if let Err(e) = orchestrator.store().test_connection().await {
            tracing::error!(error = %e, "Store connection failed");
            eprintln!("Store connection failed: {e}");
            return Ok(5);
        }

        println!("🕒 Scheduler started");
        println!("  Full scan:    {}", plan.full_scan);
        println!("  Tracked scan: {}", plan.tracked_scan);
        println!("  Morning sync: {}", plan.morning_sync);
        println!("  Hospitals:    {}", orchestrator.hospital_codes().join(", "));
        if self.dry_run || config.application.dry_run {
            println!("  🔍 DRY RUN - nothing will be written or sent");
        }

        run_until_shutdown(orchestrator, &plan, shutdown_signal).await?;
        println!("👋 Scheduler stopped");
        Ok(0)
    }
}
