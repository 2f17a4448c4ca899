//! In-memory conflict repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::foundation::{ConflictId, DomainError, ErrorCode, SyncLogId};
use crate::domain::sync::ConflictResolution;
use crate::ports::ConflictRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryConflictRepository {
    conflicts: Arc<RwLock<HashMap<ConflictId, ConflictResolution>>>,
}

impl InMemoryConflictRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.conflicts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn select(&self, predicate: impl Fn(&ConflictResolution) -> bool) -> Vec<ConflictResolution> {
        let mut found: Vec<_> = self
            .conflicts
            .read()
            .await
            .values()
            .filter(|c| predicate(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        found
    }
}

#[async_trait]
impl ConflictRepository for InMemoryConflictRepository {
    async fn save(&self, conflict: &ConflictResolution) -> Result<(), DomainError> {
        self.conflicts
            .write()
            .await
            .insert(*conflict.id(), conflict.clone());
        Ok(())
    }

    async fn update(&self, conflict: &ConflictResolution) -> Result<(), DomainError> {
        let mut conflicts = self.conflicts.write().await;
        let stored = conflicts.get_mut(conflict.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::ConflictNotFound,
                format!("Conflict not found: {}", conflict.id()),
            )
        })?;
        if stored.is_resolved() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Conflict {} is already resolved", conflict.id()),
            ));
        }
        *stored = conflict.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &ConflictId) -> Result<Option<ConflictResolution>, DomainError> {
        Ok(self.conflicts.read().await.get(id).cloned())
    }

    async fn find_open(&self, limit: u32) -> Result<Vec<ConflictResolution>, DomainError> {
        let mut open = self.select(|c| !c.is_resolved()).await;
        open.truncate(limit as usize);
        Ok(open)
    }

    async fn find_by_sync_log(
        &self,
        sync_log_id: &SyncLogId,
    ) -> Result<Vec<ConflictResolution>, DomainError> {
        Ok(self.select(|c| c.sync_log_id() == sync_log_id).await)
    }

    async fn find_by_entity(
        &self,
        entity_id: &Uuid,
    ) -> Result<Vec<ConflictResolution>, DomainError> {
        Ok(self.select(|c| c.entity_id() == entity_id).await)
    }
}
