//! Ingestion pipeline
//!
//! - [`orchestrator`] - full scan, tracked scan and morning sync
//! - [`gate`] - decides when a session is live enough to fetch progress
//! - [`writer`] - deduplicated, batched snapshot upserts
//! - [`summary`] - per-cycle and per-hospital counts

pub mod gate;
pub mod orchestrator;
pub mod summary;
pub mod writer;

pub use gate::LiveFetchGate;
pub use orchestrator::{IngestOrchestrator, PolitenessDelay};
pub use summary::{HospitalScan, ScanMode, ScanSummary, WriteSummary};
pub use writer::{SnapshotWriter, DEFAULT_BATCH_SIZE};
