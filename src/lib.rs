// Queuewatch - Outpatient Queue Scraper and Alert Engine
// Copyright (c) 2025 Queuewatch Contributors
// Licensed under the MIT License

//! # queuewatch - outpatient queue scraper and alert engine
//!
//! queuewatch follows outpatient clinic queues at hospitals that publish
//! their schedules and live call numbers only as HTML pages, and alerts
//! subscribed patients by email or LINE as their turn approaches.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Scraping** department lists, doctor schedules and live clinic progress
//!   through one adapter per hospital site
//! - **Storing** schedule and progress snapshots with batched, idempotent upserts
//! - **Alerting** each subscription once per threshold (20, 10 and 5 people ahead)
//! - **Estimating** when a given ticket will be called
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Ingestion, notification engine, ETA and scheduling
//! - [`adapters`] - Hospital sites, PostgreSQL, messaging transports
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use queuewatch::config::load_config;
//! use queuewatch::core::ingest::IngestOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("queuewatch.toml")?;
//!     let orchestrator = IngestOrchestrator::from_config(&config, false)?;
//!
//!     let summary = orchestrator.full_scan(None).await;
//!     println!("Wrote {} snapshot rows", summary.rows_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Arrival estimates
//!
//! ```rust
//! use queuewatch::core::eta::estimate_eta;
//! use queuewatch::domain::{Clock, FixedClock, SessionType};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let now = FixedClock::at_local(date, 13, 0).unwrap().now();
//!
//! // Afternoon clinic not started yet: five ahead at five minutes each from 13:30
//! let eta = estimate_eta(date, SessionType::Afternoon, Some(5), None, &[], Some(10), now);
//! assert_eq!(eta.to_string(), "13:55");
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::QueueWatchError`]; scraping failures carry a
//! typed [`domain::ScrapeError`] inside it.
//!
//! ```rust,no_run
//! use queuewatch::domain::QueueWatchError;
//!
//! fn example() -> Result<(), QueueWatchError> {
//!     let config = queuewatch::config::load_config("queuewatch.toml")?;
//!     println!("{} hospitals", config.hospitals.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
