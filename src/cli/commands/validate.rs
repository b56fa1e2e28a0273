//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the queuewatch configuration file.

use crate::config::load_config;
use crate::config::schema::DatabaseTarget;
use crate::core::scheduler::CronPlan;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates every section
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let plan = match CronPlan::from_config(&config.schedule) {
            Ok(plan) => plan,
            Err(e) => {
                println!("❌ Invalid schedule");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        for hospital in &config.hospitals {
            println!(
                "  Hospital: {} ({}, {}){}",
                hospital.code,
                hospital.adapter,
                hospital.base_url,
                if hospital.enabled { "" } else { " [disabled]" }
            );
        }

        match config.database_target {
            DatabaseTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Database Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        masked_host(pg_config.connection_string.expose_secret().as_ref())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            DatabaseTarget::Memory => {
                println!("  Database Target: in-memory (nothing persists)");
            }
        }

        println!("  Full Scan Cron: {}", plan.full_scan);
        println!("  Tracked Scan Cron: {}", plan.tracked_scan);
        println!("  Morning Sync Cron: {}", plan.morning_sync);
        println!("  Live Window: {}h", config.schedule.live_window_hours);
        println!(
            "  Notifications: {} (email {}, LINE {})",
            if config.notification.enabled { "on" } else { "off" },
            if config.notification.email.enabled { "on" } else { "off" },
            if config.notification.line.enabled { "on" } else { "off" }
        );
        println!();
        Ok(0)
    }
}

/// Strip credentials from a connection string, keeping only what follows the last `@`
fn masked_host(connection_string: &str) -> &str {
    connection_string.rsplit('@').next().unwrap_or("***")
}
