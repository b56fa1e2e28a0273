//! Notification decision engine
//!
//! After each tracked scan, every active subscription for today is checked
//! against its latest snapshot. The first due threshold (20, then 10, then 5)
//! triggers one alert per enabled channel, and the threshold is then marked
//! so it never fires again that day.

pub mod engine;
pub mod message;
pub mod remaining;

pub use engine::{evaluate_thresholds, NotificationEngine, NotificationSummary, ThresholdEvaluation};
pub use message::AlertContent;
pub use remaining::{remaining_ahead, RemainingAhead, RemainingSource};
