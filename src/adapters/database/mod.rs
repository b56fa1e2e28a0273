//! Clinic store abstraction layer
//!
//! This module provides a trait-based abstraction over the persistent store,
//! allowing queuewatch to run against PostgreSQL or entirely in memory.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_clinic_store;
pub use memory::InMemoryClinicStore;
pub use traits::ClinicStore;
