//! ETA command implementation
//!
//! Prints the estimated time at which a ticket will be called.

use crate::core::eta::estimate_eta;
use crate::domain::{Clock, SessionType, SystemClock};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the eta command
#[derive(Args, Debug)]
pub struct EtaArgs {
    /// Session date, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,

    /// Session label: 上午 / 下午 / 晚上, morning / afternoon / evening
    #[arg(long)]
    pub session: String,

    /// Number currently being called
    #[arg(long)]
    pub current: Option<i32>,

    /// Patients registered so far
    #[arg(long)]
    pub registered: Option<i32>,

    /// Tickets still waiting, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub waiting: Vec<i32>,

    /// Your ticket number
    #[arg(long)]
    pub target: Option<i32>,
}

impl EtaArgs {
    /// Execute the eta command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let Some(session_type) = SessionType::from_label(&self.session) else {
            println!("❌ Unknown session '{}', no estimate", self.session);
            return Ok(1);
        };

        println!("{}", self.estimate(session_type, &SystemClock));
        Ok(0)
    }

    fn estimate(&self, session_type: SessionType, clock: &dyn Clock) -> String {
        estimate_eta(
            self.date,
            session_type,
            self.current,
            self.registered,
            &self.waiting,
            self.target,
            clock.now(),
        )
        .to_string()
    }
}
