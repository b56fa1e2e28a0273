//! Cron scheduling of scan cycles
//!
//! Three jobs run in Taiwan time: an off-peak full scan, a daytime tracked
//! scan and a one-shot morning sync. Each job owns a [`JobGuard`] so a slow
//! run is never overlapped by the next tick.

pub mod guard;
pub mod jobs;

pub use guard::{JobGuard, JobPermit};
pub use jobs::{run_until_shutdown, CronPlan, ScanScheduler};
