//! Event ledger error types.
//!
//! # Caller Mapping
//!
//! | Error | Category |
//! |-------|----------|
//! | ValidationFailed | validation |
//! | DuplicateOfflineId / DuplicateOfflineIdInBatch | idempotency |
//! | EmptyBatch / BatchTooLarge | validation |
//! | UnknownEventType / InactiveEventType / DetailMismatch | validation |
//! | NotFound | not found |
//! | InvalidSyncTransition | state |
//! | Infrastructure | store failure |

use thiserror::Error;

use super::{EventKind, EventTypeCode, SyncStatus};
use crate::domain::foundation::{DomainError, ErrorCode, EventId, ValidationError};

/// Typed failure of every ledger registration and query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Event with this offlineId already exists")]
    DuplicateOfflineId(String),

    #[error("Duplicate offlineId in batch: {0}")]
    DuplicateOfflineIdInBatch(String),

    #[error("No events provided")]
    EmptyBatch,

    #[error("Batch of {actual} events exceeds the limit of {max}")]
    BatchTooLarge { max: usize, actual: usize },

    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Event type is not active: {0}")]
    InactiveEventType(String),

    #[error("Event type {event_type} does not carry {detail_kind} details")]
    DetailMismatch {
        event_type: EventTypeCode,
        detail_kind: EventKind,
    },

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Cannot change sync status from {from} to {to}")]
    InvalidSyncTransition { from: SyncStatus, to: SyncStatus },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl EventError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EventError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EventError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EventError::ValidationFailed { .. }
            | EventError::EmptyBatch
            | EventError::BatchTooLarge { .. }
            | EventError::UnknownEventType(_)
            | EventError::InactiveEventType(_)
            | EventError::DetailMismatch { .. } => ErrorCode::ValidationFailed,
            EventError::DuplicateOfflineId(_) | EventError::DuplicateOfflineIdInBatch(_) => {
                ErrorCode::DuplicateOfflineId
            }
            EventError::NotFound(_) => ErrorCode::EventNotFound,
            EventError::InvalidSyncTransition { .. } => ErrorCode::InvalidStateTransition,
            EventError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// True for failures the caller caused and must not blindly retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EventError::Infrastructure(_))
    }
}

impl From<ValidationError> for EventError {
    fn from(err: ValidationError) -> Self {
        EventError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for EventError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::DuplicateOfflineId => EventError::DuplicateOfflineId(
                err.details.get("offline_id").cloned().unwrap_or_default(),
            ),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => EventError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => EventError::Infrastructure(err.to_string()),
        }
    }
}
