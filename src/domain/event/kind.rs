//! Event type codes and the closed set of detail-carrying event kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::EventCategory;
use crate::domain::foundation::ValidationError;

/// Maximum length of an event type code.
pub const MAX_TYPE_CODE_LENGTH: usize = 50;

/// Code identifying an event type in the external type registry.
///
/// Stored upper-cased; comparisons are therefore case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventTypeCode(String);

impl EventTypeCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::empty_field("event_type"));
        }
        if code.len() > MAX_TYPE_CODE_LENGTH {
            return Err(ValidationError::invalid_format(
                "event_type",
                format!("must be at most {} characters", MAX_TYPE_CODE_LENGTH),
            ));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "event_type",
                "only letters, digits, '_' and '-' are allowed",
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventTypeCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventTypeCode> for String {
    fn from(code: EventTypeCode) -> Self {
        code.0
    }
}

impl fmt::Display for EventTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ten event kinds that carry a variant detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birth,
    Death,
    Health,
    Movement,
    Weighing,
    Reproduction,
    Sale,
    Purchase,
    Weaning,
    Identification,
}

impl EventKind {
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::Birth,
            EventKind::Death,
            EventKind::Health,
            EventKind::Movement,
            EventKind::Weighing,
            EventKind::Reproduction,
            EventKind::Sale,
            EventKind::Purchase,
            EventKind::Weaning,
            EventKind::Identification,
        ]
    }

    /// Canonical registry code for this kind.
    pub fn type_code(&self) -> &'static str {
        match self {
            EventKind::Birth => "BIRTH",
            EventKind::Death => "DEATH",
            EventKind::Health => "HEALTH",
            EventKind::Movement => "MOVEMENT",
            EventKind::Weighing => "WEIGHING",
            EventKind::Reproduction => "REPRODUCTION",
            EventKind::Sale => "SALE",
            EventKind::Purchase => "PURCHASE",
            EventKind::Weaning => "WEANING",
            EventKind::Identification => "IDENTIFICATION",
        }
    }

    /// Category a kind falls under unless the registry says otherwise.
    pub fn default_category(&self) -> EventCategory {
        match self {
            EventKind::Birth | EventKind::Death => EventCategory::Inventory,
            EventKind::Health => EventCategory::Health,
            EventKind::Movement => EventCategory::Movement,
            EventKind::Weighing | EventKind::Weaning | EventKind::Identification => {
                EventCategory::Management
            }
            EventKind::Reproduction => EventCategory::Reproduction,
            EventKind::Sale | EventKind::Purchase => EventCategory::Financial,
        }
    }

    /// Looks up the kind whose canonical code matches.
    pub fn from_type_code(code: &EventTypeCode) -> Option<EventKind> {
        EventKind::all()
            .iter()
            .copied()
            .find(|k| k.type_code() == code.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Birth => "birth",
            EventKind::Death => "death",
            EventKind::Health => "health",
            EventKind::Movement => "movement",
            EventKind::Weighing => "weighing",
            EventKind::Reproduction => "reproduction",
            EventKind::Sale => "sale",
            EventKind::Purchase => "purchase",
            EventKind::Weaning => "weaning",
            EventKind::Identification => "identification",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
