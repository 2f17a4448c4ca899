//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Generates a UUID-backed identifier newtype.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random ", stringify!($name), ".")]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a ", stringify!($name), " from an existing UUID.")]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

/// Generates a non-empty string identifier newtype.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", stringify!($name), ", returning error if blank.")]
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(id))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a ledger event.
    EventId
);
uuid_id!(
    /// Identifier of an animal in the herd registry.
    AnimalId
);
uuid_id!(
    /// Identifier of a farm (establishment).
    FarmId
);
uuid_id!(
    /// Identifier of a lot (management group).
    LotId
);
uuid_id!(
    /// Identifier of a paddock.
    PaddockId
);
uuid_id!(
    /// Identifier of a health product in the catalogue.
    ProductId
);
uuid_id!(
    /// Identifier of a supplier.
    SupplierId
);
uuid_id!(
    /// Identifier of a device synchronization session.
    SyncLogId
);
uuid_id!(
    /// Identifier of a conflict resolution record.
    ConflictId
);

string_id!(
    /// User identifier (typically from auth provider).
    UserId,
    "user_id"
);
string_id!(
    /// Identifier of a field device.
    DeviceId,
    "device_id"
);
string_id!(
    /// Client-generated identifier used to deduplicate retried uploads.
    OfflineId,
    "offline_id"
);

/// Server-assigned position of an event in the ledger.
///
/// Only the store creates these; the domain never invents one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(i64);

impl SequenceNumber {
    /// Wraps a store-assigned sequence value.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 1 {
            return Err(ValidationError::out_of_range(
                "sequence_number",
                1.0,
                i64::MAX as f64,
                value as f64,
            ));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_generates_unique_values() {
        let id1 = EventId::new();
        let id2 = EventId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn animal_id_parses_from_valid_string() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: AnimalId = uuid_str.parse().unwrap();
        assert_eq!(id.to_string(), uuid_str);
    }

    #[test]
    fn event_id_serializes_to_json() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id: EventId = uuid_str.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid_str));
    }

    #[test]
    fn user_id_rejects_blank_string() {
        match UserId::new("   ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "user_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn offline_id_deserialization_validates() {
        let ok: OfflineId = serde_json::from_str("\"dev-1:42\"").unwrap();
        assert_eq!(ok.as_str(), "dev-1:42");
        assert!(serde_json::from_str::<OfflineId>("\"\"").is_err());
    }

    #[test]
    fn sequence_number_must_be_positive() {
        assert!(SequenceNumber::new(0).is_err());
        assert_eq!(SequenceNumber::new(7).unwrap().value(), 7);
    }
}
