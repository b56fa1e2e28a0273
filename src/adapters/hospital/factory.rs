//! Hospital adapter factory
//!
//! Selects the adapter implementation named by each `[[hospitals]]` entry.

use super::{CmuhAdapter, HmmhAdapter, HospitalAdapter};
use crate::config::{HospitalConfig, ScraperConfig};
use crate::domain::{QueueWatchError, Result};
use std::sync::Arc;

/// Create the adapter for one hospital
///
/// # Errors
///
/// Returns a configuration error for an unknown adapter name or when the
/// adapter's HTTP client cannot be built.
pub fn create_hospital_adapter(
    hospital: &HospitalConfig,
    scraper: &ScraperConfig,
) -> Result<Arc<dyn HospitalAdapter>> {
    match hospital.adapter.to_lowercase().as_str() {
        "cmuh" => {
            tracing::info!(hospital = %hospital.code, "Creating CMUH adapter");
            Ok(Arc::new(CmuhAdapter::new(hospital, scraper)?) as Arc<dyn HospitalAdapter>)
        }
        "hmmh" => {
            tracing::info!(hospital = %hospital.code, "Creating HMMH adapter");
            Ok(Arc::new(HmmhAdapter::new(hospital, scraper)?) as Arc<dyn HospitalAdapter>)
        }
        other => Err(QueueWatchError::Configuration(format!(
            "Unsupported hospital adapter '{}' for {}",
            other, hospital.code
        ))),
    }
}

/// Create adapters for the given hospitals, in configuration order
///
/// # Errors
///
/// Fails on the first hospital whose adapter cannot be created.
pub fn create_hospital_adapters<'a>(
    hospitals: impl IntoIterator<Item = &'a HospitalConfig>,
    scraper: &ScraperConfig,
) -> Result<Vec<Arc<dyn HospitalAdapter>>> {
    hospitals
        .into_iter()
        .map(|hospital| create_hospital_adapter(hospital, scraper))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital(adapter: &str) -> HospitalConfig {
        HospitalConfig {
            code: "TEST".to_string(),
            adapter: adapter.to_string(),
            base_url: "https://hospital.example".to_string(),
            detail_url: None,
            enabled: true,
        }
    }

    #[test]
    fn test_selects_adapter_by_name() {
        let scraper = ScraperConfig::default();
        let cmuh = create_hospital_adapter(&hospital("CMUH"), &scraper).unwrap();
        assert_eq!(cmuh.hospital_code(), "TEST");
        assert!(create_hospital_adapter(&hospital("hmmh"), &scraper).is_ok());
    }

    #[test]
    fn test_unknown_adapter_is_configuration_error() {
        let err = create_hospital_adapter(&hospital("ntuh"), &ScraperConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, QueueWatchError::Configuration(_)));
    }
}
