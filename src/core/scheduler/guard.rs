//! Re-entrance guard for scheduled jobs

use std::sync::atomic::{AtomicBool, Ordering};

/// One flag per job; a tick that finds it set is skipped
#[derive(Debug)]
pub struct JobGuard {
    name: &'static str,
    running: AtomicBool,
}

/// Held while a job runs; dropping it frees the guard
#[derive(Debug)]
pub struct JobPermit<'a> {
    guard: &'a JobGuard,
}

impl JobGuard {
    /// Create a free guard
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: AtomicBool::new(false),
        }
    }

    /// Job name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Take the guard, or `None` if the previous run is still going
    pub fn try_acquire(&self) -> Option<JobPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| JobPermit { guard: self })
    }
}

impl Drop for JobPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
