//! Domain identifier types
//!
//! Newtype wrappers around the store's UUID primary keys. Each entity gets its
//! own type so a doctor id can never be passed where a department id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wraps an existing UUID
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generates a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// First eight hex characters, for log lines
            pub fn short(&self) -> String {
                self.0.simple().to_string()[..8].to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| format!("Invalid {} '{}': {}", $label, s, e))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Hospital primary key
    HospitalId,
    "hospital id"
);
uuid_id!(
    /// Department primary key
    DepartmentId,
    "department id"
);
uuid_id!(
    /// Doctor primary key (one row per hospital, doctor number and department)
    DoctorId,
    "doctor id"
);
uuid_id!(
    /// Tracking subscription primary key
    SubscriptionId,
    "subscription id"
);
uuid_id!(
    /// User primary key
    UserId,
    "user id"
);
uuid_id!(
    /// Notification log row primary key
    NotificationLogId,
    "notification log id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let raw = "7d44b88c-4199-4bad-97dc-d78268e01398";
        let id = DoctorId::from_str(raw).unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_parse_invalid() {
        let err = DepartmentId::from_str("not-a-uuid").unwrap_err();
        assert!(err.contains("department id"));
    }

    #[test]
    fn test_short_form() {
        let id = SubscriptionId::from_str("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
        assert_eq!(id.short(), "7d44b88c");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(HospitalId::generate(), HospitalId::generate());
    }
}
