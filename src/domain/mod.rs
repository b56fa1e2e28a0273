//! Domain models and types for queuewatch.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`DoctorId`], [`DepartmentId`], [`SubscriptionId`], ...)
//! - **Scraped records** ([`DepartmentRecord`], [`DoctorSlot`], [`ClinicProgress`])
//! - **Persisted rows** ([`SnapshotRow`], [`NotificationLogEntry`])
//! - **Subscriptions** ([`TrackingSubscription`], [`Threshold`])
//! - **Session types and local time** ([`SessionType`], [`Clock`])
//! - **Error types** ([`QueueWatchError`], [`ScrapeError`]) and the [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use queuewatch::domain::{split_doctor_name, SessionType};
//!
//! let (name, specialty) = split_doctor_name("王小明(教學診)");
//! assert_eq!(name, "王小明");
//! assert_eq!(specialty.as_deref(), Some("教學診"));
//! assert_eq!(SessionType::Morning.label(), "上午");
//! ```

pub mod catalog;
pub mod clock;
pub mod errors;
pub mod ids;
pub mod notification;
pub mod records;
pub mod result;
pub mod session;
pub mod snapshot;
pub mod subscription;

// Re-export commonly used types for convenience
pub use catalog::{StoredDepartment, StoredDoctor};
pub use clock::{taiwan_offset, Clock, FixedClock, SystemClock};
pub use errors::{QueueWatchError, ScrapeError};
pub use ids::{DepartmentId, DoctorId, HospitalId, NotificationLogId, SubscriptionId, UserId};
pub use notification::{Channel, DeliveryReport, NotificationLogEntry};
pub use records::{
    split_doctor_name, ClinicProgress, ClinicState, DepartmentRecord, DoctorProfile, DoctorSlot,
    QueueEntry,
};
pub use result::Result;
pub use session::SessionType;
pub use snapshot::{SnapshotKey, SnapshotRow};
pub use subscription::{
    SubscriptionContext, Threshold, ThresholdFlags, TrackingSubscription, TrackingTarget,
};
