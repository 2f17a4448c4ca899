//! Sync log repository port.

use crate::domain::foundation::{DeviceId, DomainError, SyncLogId};
use crate::domain::sync::SyncRunLog;
use async_trait::async_trait;

/// Persistence for sync session logs.
///
/// Implementations must refuse to update a log that is already finalized.
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    async fn save(&self, log: &SyncRunLog) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `SyncLogNotFound` if the log doesn't exist
    /// - `InvalidStateTransition` if the stored log is already finalized
    async fn update(&self, log: &SyncRunLog) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SyncLogId) -> Result<Option<SyncRunLog>, DomainError>;

    /// Most recent `completed` or `partial` session of a device.
    async fn last_successful(&self, device_id: &DeviceId)
        -> Result<Option<SyncRunLog>, DomainError>;
}
