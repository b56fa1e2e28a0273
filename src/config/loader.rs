//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, QueueWatchConfig};
use super::secret::secret_string;
use crate::domain::errors::QueueWatchError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into QueueWatchConfig
/// 4. Applies environment variable overrides (QUEUEWATCH_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`QueueWatchError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// fails.
///
/// # Examples
///
/// ```no_run
/// use queuewatch::config::load_config;
///
/// let config = load_config("queuewatch.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<QueueWatchConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(QueueWatchError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        QueueWatchError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<QueueWatchConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: QueueWatchConfig = toml::from_str(&contents)
        .map_err(|e| QueueWatchError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        QueueWatchError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| QueueWatchError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(QueueWatchError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the QUEUEWATCH_* prefix
///
/// Variables follow the pattern `QUEUEWATCH_<SECTION>_<KEY>`, for example
/// `QUEUEWATCH_SCHEDULE_INTERVAL_MINUTES` or `QUEUEWATCH_LINE_CHANNEL_ACCESS_TOKEN`.
fn apply_env_overrides(config: &mut QueueWatchConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Scraper overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_SCRAPER_REQUEST_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.scraper.request_timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCRAPER_DETAIL_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.scraper.detail_concurrency = concurrency;
        }
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCRAPER_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.scraper.retry.max_retries = retries;
        }
    }

    // Schedule overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_SCHEDULE_FULL_SCAN_HOURS") {
        config.schedule.full_scan_hours = val;
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCHEDULE_TRACKED_SCAN_HOURS") {
        config.schedule.tracked_scan_hours = val;
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCHEDULE_INTERVAL_MINUTES") {
        if let Ok(interval) = val.parse() {
            config.schedule.interval_minutes = interval;
        }
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCHEDULE_MORNING_SYNC_TIME") {
        config.schedule.morning_sync_time = val;
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_SCHEDULE_LIVE_WINDOW_HOURS") {
        if let Ok(hours) = val.parse() {
            config.schedule.live_window_hours = hours;
        }
    }

    // Database overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_DATABASE_TARGET") {
        match val.to_lowercase().as_str() {
            "postgresql" => config.database_target = DatabaseTarget::PostgreSQL,
            "memory" => config.database_target = DatabaseTarget::Memory,
            other => {
                return Err(QueueWatchError::Configuration(format!(
                    "Invalid QUEUEWATCH_DATABASE_TARGET '{}'. Must be postgresql or memory",
                    other
                )))
            }
        }
    }
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("QUEUEWATCH_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("QUEUEWATCH_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg_config.max_connections = max;
            }
        }
    }

    // Notification overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_NOTIFICATION_ENABLED") {
        config.notification.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_EMAIL_ENDPOINT") {
        config.notification.email.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_EMAIL_API_KEY") {
        config.notification.email.api_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_LINE_CHANNEL_ACCESS_TOKEN") {
        config.notification.line.channel_access_token = Some(secret_string(val));
    }

    // Logging overrides
    if let Ok(val) = std::env::var("QUEUEWATCH_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("QUEUEWATCH_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const MINIMAL: &str = r#"
database_target = "memory"

[[hospitals]]
code = "CMUH"
adapter = "cmuh"
base_url = "https://www.cmuh.cmu.edu.tw"
"#;

    #[test]
    fn test_substitute_env_vars() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("QW_TEST_TOKEN", "token_value");
        let input = "channel_access_token = \"${QW_TEST_TOKEN}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "channel_access_token = \"token_value\"\n");
        std::env::remove_var("QW_TEST_TOKEN");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::remove_var("QW_MISSING_VAR");
        let input = "api_key = \"${QW_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("QW_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::remove_var("QW_COMMENTED");
        let input = "# token = \"${QW_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent-queuewatch.toml").is_err());
    }

    #[test]
    fn test_load_config_minimal_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.hospitals.len(), 1);
        assert_eq!(config.database_target, DatabaseTarget::Memory);
        assert_eq!(config.schedule.full_scan_hours, "0-5");
        assert_eq!(config.schedule.live_window_hours, 4);
        assert_eq!(config.scraper.detail_concurrency, 5);
    }

    #[test]
    fn test_env_override_interval() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("QUEUEWATCH_SCHEDULE_INTERVAL_MINUTES", "10");
        let config = parse_config(MINIMAL);
        std::env::remove_var("QUEUEWATCH_SCHEDULE_INTERVAL_MINUTES");

        assert_eq!(config.unwrap().schedule.interval_minutes, 10);
    }

    #[test]
    fn test_invalid_database_target_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("QUEUEWATCH_DATABASE_TARGET", "sqlite");
        let result = parse_config(MINIMAL);
        std::env::remove_var("QUEUEWATCH_DATABASE_TARGET");

        assert!(result.is_err());
    }
}
