//! Synchronization error types.

use thiserror::Error;

use crate::domain::event::EventError;
use crate::domain::foundation::{ConflictId, DomainError, ErrorCode, SyncLogId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("Conflict not found: {0}")]
    ConflictNotFound(ConflictId),

    #[error("Sync log not found: {0}")]
    SyncLogNotFound(SyncLogId),

    #[error("Conflict {0} is already resolved")]
    AlreadyResolved(ConflictId),

    #[error("A resolver is required for admin-decided conflicts")]
    ResolverRequired,

    #[error("Merge resolution requires a merged payload")]
    MergedPayloadRequired,

    #[error("Invalid resolution strategy: {0}")]
    InvalidStrategy(String),

    #[error("Sync log {0} is already finalized")]
    AlreadyFinalized(SyncLogId),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::ConflictNotFound(_) => ErrorCode::ConflictNotFound,
            SyncError::SyncLogNotFound(_) => ErrorCode::SyncLogNotFound,
            SyncError::AlreadyResolved(_) | SyncError::AlreadyFinalized(_) => {
                ErrorCode::InvalidStateTransition
            }
            SyncError::ResolverRequired
            | SyncError::MergedPayloadRequired
            | SyncError::InvalidStrategy(_) => ErrorCode::ValidationFailed,
            SyncError::Event(e) => e.code(),
            SyncError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for SyncError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                SyncError::Infrastructure(err.to_string())
            }
            _ => SyncError::Event(EventError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_errors_keep_their_code() {
        let err = SyncError::from(EventError::EmptyBatch);
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.to_string(), "No events provided");
    }

    #[test]
    fn database_failures_are_infrastructure() {
        let err = SyncError::from(DomainError::new(ErrorCode::DatabaseError, "timeout"));
        assert!(matches!(err, SyncError::Infrastructure(_)));
    }

    #[test]
    fn duplicate_offline_id_passes_through_as_event_error() {
        let err = SyncError::from(
            DomainError::new(ErrorCode::DuplicateOfflineId, "dup").with_detail("offline_id", "a"),
        );
        assert_eq!(
            err,
            SyncError::Event(EventError::DuplicateOfflineId("a".to_string()))
        );
    }
}
