//! Clinic store factory
//!
//! This module creates the configured [`ClinicStore`] implementation.

use crate::adapters::database::memory::InMemoryClinicStore;
use crate::adapters::database::traits::ClinicStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLClinicStore};
use crate::config::{DatabaseTarget, QueueWatchConfig};
use crate::domain::{QueueWatchError, Result};
use std::sync::Arc;

/// Create a clinic store based on the configuration
///
/// This factory function examines the `database_target` in the configuration
/// and creates the matching store.
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or its pool cannot
/// be built.
pub fn create_clinic_store(config: &QueueWatchConfig) -> Result<Arc<dyn ClinicStore>> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                QueueWatchError::Configuration(
                    "postgresql section is required when database_target is postgresql"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL clinic store");
            let client = PostgreSQLClient::new(pg_config.clone())?;
            Ok(Arc::new(PostgreSQLClinicStore::new(client)))
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory clinic store");
            Ok(Arc::new(InMemoryClinicStore::new()))
        }
    }
}
