//! Event type registry port.
//!
//! Resolves a type code to its definition before any registration is
//! accepted. Unknown or inactive codes never reach the ledger.

use serde::{Deserialize, Serialize};

use crate::domain::event::{EventCategory, EventKind, EventTypeCode};
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Registry entry for one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeDefinition {
    pub code: EventTypeCode,
    pub name: String,
    pub category: EventCategory,
    /// Detail kind carried by events of this type, if any.
    pub kind: Option<EventKind>,
    pub active: bool,
}

impl EventTypeDefinition {
    /// Canonical definition for one of the ten detail-carrying kinds.
    pub fn canonical(kind: EventKind) -> Result<Self, DomainError> {
        Ok(Self {
            code: EventTypeCode::new(kind.type_code())?,
            name: kind.as_str().to_string(),
            category: kind.default_category(),
            kind: Some(kind),
            active: true,
        })
    }
}

#[async_trait]
pub trait EventTypeRegistry: Send + Sync {
    /// Returns `None` for unknown codes.
    async fn resolve(
        &self,
        code: &EventTypeCode,
    ) -> Result<Option<EventTypeDefinition>, DomainError>;
}
