//! Event repository port (write side).
//!
//! The ledger store boundary for appending events and moving their sync
//! status. Business content is never updated.
//!
//! # Design
//!
//! - **Atomic**: an event and its variant detail are written together or not at all
//! - **Uniqueness backstop**: implementations enforce unique offline ids and
//!   report violations as `DuplicateOfflineId`
//! - **Store-assigned sequence**: sequence numbers come from the store on sync

use crate::domain::event::AnimalEvent;
use crate::domain::foundation::{DomainError, EventId, OfflineId};
use async_trait::async_trait;

/// Repository port for ledger event persistence.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append one event and its detail.
    ///
    /// # Errors
    ///
    /// - `DuplicateOfflineId` if the offline id is already stored
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, event: &AnimalEvent) -> Result<(), DomainError>;

    /// Append a batch of events in one all-or-nothing write, in input order.
    ///
    /// # Errors
    ///
    /// - `DuplicateOfflineId` if any offline id is already stored
    /// - `DatabaseError` on persistence failure
    async fn insert_batch(&self, events: &[AnimalEvent]) -> Result<(), DomainError>;

    /// Persist the event's current sync status and sync date.
    ///
    /// When the event is `Synced` without a sequence number, the store assigns
    /// the next one. Returns the stored event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event doesn't exist
    /// - `InvalidStateTransition` if the stored status can't move to the new one
    /// - `DatabaseError` on persistence failure
    async fn update_sync_status(&self, event: &AnimalEvent) -> Result<AnimalEvent, DomainError>;

    /// Find an event by its ID.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<AnimalEvent>, DomainError>;

    /// Dedup lookup.
    async fn find_by_offline_id(
        &self,
        offline_id: &OfflineId,
    ) -> Result<Option<AnimalEvent>, DomainError>;

    /// Returns those of `offline_ids` that are already stored.
    async fn existing_offline_ids(
        &self,
        offline_ids: &[OfflineId],
    ) -> Result<Vec<OfflineId>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn EventRepository) {}
    }
}
