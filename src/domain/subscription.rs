//! Tracking subscriptions and alert thresholds

use crate::domain::ids::{DepartmentId, DoctorId, SubscriptionId, UserId};
use crate::domain::session::SessionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Remaining-ahead level at which a one-time alert is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Threshold {
    Twenty,
    Ten,
    Five,
}

impl Threshold {
    /// Evaluation order: least urgent first
    pub const ORDER: [Threshold; 3] = [Threshold::Twenty, Threshold::Ten, Threshold::Five];

    /// Numeric value
    pub fn value(&self) -> i32 {
        match self {
            Threshold::Twenty => 20,
            Threshold::Ten => 10,
            Threshold::Five => 5,
        }
    }

    /// Column holding the "already notified" flag
    pub fn notified_column(&self) -> &'static str {
        match self {
            Threshold::Twenty => "notified_20",
            Threshold::Ten => "notified_10",
            Threshold::Five => "notified_5",
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One boolean per threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdFlags {
    pub at_20: bool,
    pub at_10: bool,
    pub at_5: bool,
}

impl ThresholdFlags {
    /// All three flags set
    pub fn all() -> Self {
        Self {
            at_20: true,
            at_10: true,
            at_5: true,
        }
    }

    /// Flag for a threshold
    pub fn get(&self, threshold: Threshold) -> bool {
        match threshold {
            Threshold::Twenty => self.at_20,
            Threshold::Ten => self.at_10,
            Threshold::Five => self.at_5,
        }
    }

    /// Set the flag for a threshold
    pub fn set(&mut self, threshold: Threshold, value: bool) {
        match threshold {
            Threshold::Twenty => self.at_20 = value,
            Threshold::Ten => self.at_10 = value,
            Threshold::Five => self.at_5 = value,
        }
    }
}

/// A user's request to be alerted about one doctor's session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSubscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub doctor_id: DoctorId,
    /// Set when the whole department is tracked
    pub department_id: Option<DepartmentId>,
    pub session_date: NaiveDate,
    pub session_type: SessionType,
    /// The user's own ticket number, if they entered one
    pub target_number: Option<i32>,
    pub notify_at: ThresholdFlags,
    pub notified: ThresholdFlags,
    pub notify_email: bool,
    pub notify_line: bool,
    pub is_active: bool,
}

/// Subscription joined with display fields and recipients for message building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionContext {
    pub subscription: TrackingSubscription,
    pub doctor_name: Option<String>,
    pub department_name: Option<String>,
    pub hospital_name: Option<String>,
    pub email: Option<String>,
    pub line_user_id: Option<String>,
}

impl SubscriptionContext {
    /// Context with no display fields or recipients
    pub fn bare(subscription: TrackingSubscription) -> Self {
        Self {
            subscription,
            doctor_name: None,
            department_name: None,
            hospital_name: None,
            email: None,
            line_user_id: None,
        }
    }
}

/// Minimal projection of a subscription used to pick what to scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackingTarget {
    pub doctor_id: DoctorId,
    pub department_id: Option<DepartmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_order_is_descending() {
        let values: Vec<i32> = Threshold::ORDER.iter().map(|t| t.value()).collect();
        assert_eq!(values, vec![20, 10, 5]);
    }

    #[test]
    fn test_flags_get_set() {
        let mut flags = ThresholdFlags::default();
        assert!(!flags.get(Threshold::Ten));
        flags.set(Threshold::Ten, true);
        assert!(flags.get(Threshold::Ten));
        assert!(!flags.get(Threshold::Twenty));
        assert!(!flags.get(Threshold::Five));
    }

    #[test]
    fn test_notified_columns() {
        assert_eq!(Threshold::Twenty.notified_column(), "notified_20");
        assert_eq!(Threshold::Five.notified_column(), "notified_5");
    }
}
