//! Configuration management for queuewatch.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `QUEUEWATCH_*`
//! environment overrides, defaults for every optional setting and validation
//! on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use queuewatch::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("queuewatch.toml")?;
//!
//! for hospital in config.enabled_hospitals() {
//!     println!("{} via {}", hospital.code, hospital.adapter);
//! }
//! println!("Tracked scans every {} minutes", config.schedule.interval_minutes);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run
//! - [`ScraperConfig`] - timeouts, detail concurrency, politeness delay, retry
//! - [`HospitalConfig`] - one `[[hospitals]]` entry per scraped site
//! - [`ScheduleConfig`] - cron windows and live-fetch gate
//! - [`PostgreSQLConfig`] - database connection
//! - [`NotificationConfig`] - email relay and LINE push
//! - [`LoggingConfig`] - local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [[hospitals]]
//! code = "CMUH"
//! adapter = "cmuh"
//! base_url = "https://www.cmuh.cmu.edu.tw"
//! detail_url = "https://appointment.cmuh.org.tw"
//!
//! [postgresql]
//! connection_string = "${QUEUEWATCH_DATABASE_URL}"
//!
//! [notification.line]
//! enabled = true
//! channel_access_token = "${QUEUEWATCH_LINE_TOKEN}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    parse_hour_range, ApplicationConfig, DatabaseTarget, EmailConfig, HospitalConfig, LineConfig,
    LoggingConfig, NotificationConfig, PostgreSQLConfig, QueueWatchConfig, RetryConfig,
    ScheduleConfig, ScraperConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
