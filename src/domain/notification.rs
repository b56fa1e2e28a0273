//! Notification channels and the audit log of send attempts

use crate::domain::ids::{DoctorId, SubscriptionId};
use crate::domain::subscription::Threshold;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message written into a log row before the transport is called
pub const PENDING_MESSAGE: &str = "Started sending...";

/// Outbound channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Line,
}

impl Channel {
    /// Lowercase name stored in the log
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Line => "line",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured outcome of one transport call
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

impl DeliveryReport {
    /// Successful delivery
    pub fn delivered(status_code: Option<u16>) -> Self {
        Self {
            success: true,
            status_code,
            error_message: None,
        }
    }

    /// Failed delivery
    pub fn failed(status_code: Option<u16>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            error_message: Some(error.into()),
        }
    }
}

/// One row per send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLogEntry {
    pub subscription_id: SubscriptionId,
    pub threshold: i32,
    pub channel: Channel,
    pub recipient: String,
    pub message: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub status_code: Option<u16>,
    pub doctor_id: Option<DoctorId>,
    pub hospital_name: Option<String>,
    pub department_name: Option<String>,
    pub clinic_room: Option<String>,
    pub session_date: Option<NaiveDate>,
    pub current_number: Option<i32>,
    pub sent_at: DateTime<FixedOffset>,
}

impl NotificationLogEntry {
    /// Row recorded before the transport is called
    pub fn pending(
        subscription_id: SubscriptionId,
        threshold: Threshold,
        channel: Channel,
        recipient: impl Into<String>,
        message: impl Into<String>,
        sent_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            subscription_id,
            threshold: threshold.value(),
            channel,
            recipient: recipient.into(),
            message: message.into(),
            success: false,
            error_message: Some(PENDING_MESSAGE.to_string()),
            status_code: None,
            doctor_id: None,
            hospital_name: None,
            department_name: None,
            clinic_room: None,
            session_date: None,
            current_number: None,
            sent_at,
        }
    }

    /// Record the final transport outcome
    pub fn complete(&mut self, report: &DeliveryReport) {
        self.success = report.success;
        self.error_message = report.error_message.clone();
        self.status_code = report.status_code;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::{Clock, SystemClock};

    #[test]
    fn test_pending_then_complete() {
        let mut entry = NotificationLogEntry::pending(
            SubscriptionId::generate(),
            Threshold::Ten,
            Channel::Line,
            "U123",
            "LINE: hi",
            SystemClock.now(),
        );
        assert!(!entry.success);
        assert_eq!(entry.error_message.as_deref(), Some(PENDING_MESSAGE));
        assert_eq!(entry.threshold, 10);

        entry.complete(&DeliveryReport::failed(Some(400), "bad request"));
        assert!(!entry.success);
        assert_eq!(entry.status_code, Some(400));
        assert_eq!(entry.error_message.as_deref(), Some("bad request"));

        entry.complete(&DeliveryReport::delivered(Some(200)));
        assert!(entry.success);
        assert!(entry.error_message.is_none());
    }
}
