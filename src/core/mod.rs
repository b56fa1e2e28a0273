//! Core business logic for queuewatch.
//!
//! # Modules
//!
//! - [`ingest`] - scan orchestration, live-fetch gate and snapshot writes
//! - [`notify`] - remaining-ahead, threshold state machine and alert dispatch
//! - [`eta`] - arrival time estimates
//! - [`scheduler`] - cron jobs with re-entrance guards
//!
//! # Example
//!
//! ```rust,no_run
//! use queuewatch::config::load_config;
//! use queuewatch::core::ingest::IngestOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("queuewatch.toml")?;
//! let orchestrator = IngestOrchestrator::from_config(&config, false)?;
//!
//! let summary = orchestrator.tracked_scan(None).await;
//! println!("Rows written: {}", summary.rows_written());
//! println!("Alerts fired: {}", summary.alerts_fired);
//! # Ok(())
//! # }
//! ```

pub mod eta;
pub mod ingest;
pub mod notify;
pub mod scheduler;
