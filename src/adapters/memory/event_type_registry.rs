//! In-memory event type registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::event::{EventKind, EventTypeCode};
use crate::domain::foundation::DomainError;
use crate::ports::{EventTypeDefinition, EventTypeRegistry};

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventTypeRegistry {
    definitions: Arc<RwLock<HashMap<EventTypeCode, EventTypeDefinition>>>,
}

impl InMemoryEventTypeRegistry {
    /// Empty registry; every code is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the ten canonical, active codes.
    pub fn with_defaults() -> Self {
        let definitions = EventKind::all()
            .iter()
            .filter_map(|kind| EventTypeDefinition::canonical(*kind).ok())
            .map(|def| (def.code.clone(), def))
            .collect();
        Self {
            definitions: Arc::new(RwLock::new(definitions)),
        }
    }

    pub async fn register(&self, definition: EventTypeDefinition) {
        self.definitions
            .write()
            .await
            .insert(definition.code.clone(), definition);
    }

    /// Returns false when the code is unknown.
    pub async fn deactivate(&self, code: &EventTypeCode) -> bool {
        match self.definitions.write().await.get_mut(code) {
            Some(def) => {
                def.active = false;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl EventTypeRegistry for InMemoryEventTypeRegistry {
    async fn resolve(
        &self,
        code: &EventTypeCode,
    ) -> Result<Option<EventTypeDefinition>, DomainError> {
        Ok(self.definitions.read().await.get(code).cloned())
    }
}
