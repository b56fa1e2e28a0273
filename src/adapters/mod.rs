//! External system adapters
//!
//! Hospital sites, the clinic store and message transports, each behind a
//! trait so the core never depends on a concrete implementation.

pub mod database;
pub mod hospital;
pub mod messaging;
pub mod postgresql;
pub mod retry;
