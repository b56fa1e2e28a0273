//! PostgreSQL integration
//!
//! This module provides the pooled client and the [`ClinicStore`] implementation
//! backed by it.
//!
//! [`ClinicStore`]: crate::adapters::database::ClinicStore

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLClinicStore;
pub use client::PostgreSQLClient;
pub use models::PostgreSQLSnapshot;
