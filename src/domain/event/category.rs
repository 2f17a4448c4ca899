//! Event category enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Business area an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Inventory,
    Health,
    Reproduction,
    Management,
    Movement,
    Financial,
}

impl EventCategory {
    /// Returns all categories.
    pub fn all() -> &'static [EventCategory] {
        &[
            EventCategory::Inventory,
            EventCategory::Health,
            EventCategory::Reproduction,
            EventCategory::Management,
            EventCategory::Movement,
            EventCategory::Financial,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Inventory => "inventory",
            EventCategory::Health => "health",
            EventCategory::Reproduction => "reproduction",
            EventCategory::Management => "management",
            EventCategory::Movement => "movement",
            EventCategory::Financial => "financial",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format("category", format!("unknown category '{}'", s))
            })
    }
}
