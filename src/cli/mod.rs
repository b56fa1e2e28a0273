//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for queuewatch using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// queuewatch - outpatient queue scraper and alert engine
#[derive(Parser, Debug)]
#[command(name = "queuewatch")]
#[command(version, about, long_about = None)]
#[command(author = "Queuewatch Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "queuewatch.toml", env = "QUEUEWATCH_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "QUEUEWATCH_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the cron scheduler until interrupted
    Run(commands::run::RunArgs),

    /// Run one scan cycle now
    Scan(commands::scan::ScanArgs),

    /// Estimate when a ticket will be called
    Eta(commands::eta::EtaArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
