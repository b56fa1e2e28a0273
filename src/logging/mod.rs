//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output with configurable level
//! - JSON log file with daily or hourly rotation
//! - helper macros for scan cycles, retries and alerts
//!
//! # Example
//!
//! ```no_run
//! use queuewatch::logging::init_logging;
//! use queuewatch::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(hospital = "CMUH", "Scanner started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a scan cycle for one hospital
///
/// # Example
///
/// ```no_run
/// use queuewatch::log_scan_start;
///
/// log_scan_start!("tracked", "CMUH");
/// ```
#[macro_export]
macro_rules! log_scan_start {
    ($mode:expr, $hospital:expr) => {
        tracing::info!(mode = %$mode, hospital = %$hospital, "Starting scan")
    };
}

/// Log the completion of a scan cycle for one hospital
///
/// # Example
///
/// ```no_run
/// use queuewatch::log_scan_complete;
/// use std::time::Duration;
///
/// log_scan_complete!("full", "HMMH", 240, Duration::from_secs(95));
/// ```
#[macro_export]
macro_rules! log_scan_complete {
    ($mode:expr, $hospital:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            mode = %$mode,
            hospital = %$hospital,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Scan completed"
        )
    };
}

/// Log a unit (department or doctor) skipped after an error
///
/// # Example
///
/// ```no_run
/// use queuewatch::log_unit_skipped;
///
/// log_unit_skipped!("department", "0100", "HTTP 500");
/// ```
#[macro_export]
macro_rules! log_unit_skipped {
    ($unit:expr, $id:expr, $error:expr) => {
        tracing::warn!(unit = $unit, id = %$id, error = %$error, "Skipping unit after error")
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use queuewatch::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 4000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            error = %$reason,
            "Retrying request after error"
        )
    };
}

/// Log an alert dispatch outcome
///
/// # Example
///
/// ```no_run
/// use queuewatch::log_alert_sent;
///
/// log_alert_sent!("sub-1234", 10, "line", true);
/// ```
#[macro_export]
macro_rules! log_alert_sent {
    ($subscription:expr, $threshold:expr, $channel:expr, $success:expr) => {
        tracing::info!(
            subscription = %$subscription,
            threshold = $threshold,
            channel = %$channel,
            success = $success,
            "Alert dispatched"
        )
    };
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        crate::log_scan_start!("full", "CMUH");
        crate::log_scan_complete!("full", "CMUH", 10usize, Duration::from_millis(5));
        crate::log_unit_skipped!("doctor", "D123", "timeout");
        crate::log_retry_attempt!(1usize, 3usize, 2000u64, "boom");
        crate::log_alert_sent!("abcd1234", 20, "email", false);
    }

    #[test]
    fn test_macros_usable_as_match_arms() {
        let outcomes: Vec<Result<usize, &str>> = vec![Ok(3), Err("HTTP 500")];
        let mut rows = 0;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(found) => rows += found,
                Err(e) => crate::log_unit_skipped!("doctor", i, e),
            }
        }
        assert_eq!(rows, 3);

        let attempt = 2usize;
        if attempt > 1 {
            crate::log_retry_attempt!(attempt, 3usize, 4000u64, "timeout")
        }
    }
}
