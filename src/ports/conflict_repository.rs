//! Conflict repository port.

use uuid::Uuid;

use crate::domain::foundation::{ConflictId, DomainError, SyncLogId};
use crate::domain::sync::ConflictResolution;
use async_trait::async_trait;

#[async_trait]
pub trait ConflictRepository: Send + Sync {
    async fn save(&self, conflict: &ConflictResolution) -> Result<(), DomainError>;

    /// Persist a resolution.
    ///
    /// # Errors
    ///
    /// - `ConflictNotFound` if the record doesn't exist
    /// - `InvalidStateTransition` if the stored record is already resolved
    async fn update(&self, conflict: &ConflictResolution) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ConflictId) -> Result<Option<ConflictResolution>, DomainError>;

    /// Unresolved records, oldest first.
    async fn find_open(&self, limit: u32) -> Result<Vec<ConflictResolution>, DomainError>;

    async fn find_by_sync_log(
        &self,
        sync_log_id: &SyncLogId,
    ) -> Result<Vec<ConflictResolution>, DomainError>;

    async fn find_by_entity(&self, entity_id: &Uuid)
        -> Result<Vec<ConflictResolution>, DomainError>;
}
