//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod eta;
pub mod init;
pub mod run;
pub mod scan;
pub mod validate;
