//! Sync run log - one record per device synchronization session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SyncError;
use crate::domain::foundation::{
    DeviceId, SequenceNumber, StateMachine, SyncLogId, Timestamp, UserId, ValidationError,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    #[default]
    Started,
    Completed,
    Error,
    /// Finished, but at least one record ended in conflict.
    Partial,
}

impl SyncRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRunStatus::Started => "started",
            SyncRunStatus::Completed => "completed",
            SyncRunStatus::Error => "error",
            SyncRunStatus::Partial => "partial",
        }
    }
}

impl StateMachine for SyncRunStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SyncRunStatus::*;
        matches!(
            (self, target),
            (Started, Completed) | (Started, Error) | (Started, Partial)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SyncRunStatus::*;
        match self {
            Started => vec![Completed, Error, Partial],
            Completed | Error | Partial => vec![],
        }
    }
}

impl fmt::Display for SyncRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncRunStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(SyncRunStatus::Started),
            "completed" => Ok(SyncRunStatus::Completed),
            "error" => Ok(SyncRunStatus::Error),
            "partial" => Ok(SyncRunStatus::Partial),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown sync run status '{}'", other),
            )),
        }
    }
}

/// Record counts reported when a session finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub uploaded: u32,
    pub downloaded: u32,
    pub conflicts: u32,
}

/// Sync session log.
///
/// # Invariants
///
/// - Created in `Started`
/// - Finalized exactly once, never reopened
/// - `finished_at >= started_at` once finalized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunLog {
    pub id: SyncLogId,

    /// Device whose offline queue is being synchronized.
    pub device_id: DeviceId,

    pub user_id: UserId,

    pub started_at: Timestamp,

    pub finished_at: Option<Timestamp>,

    pub status: SyncRunStatus,

    pub counts: SyncCounts,

    pub error_message: Option<String>,

    /// Wall time of the session in milliseconds, set on finalize.
    pub duration_ms: Option<u64>,

    /// Highest sequence number handed to the device so far.
    ///
    /// The next session downloads strictly after it.
    #[serde(default)]
    pub download_cursor: Option<SequenceNumber>,
}

impl SyncRunLog {
    pub fn start(device_id: DeviceId, user_id: UserId, at: Timestamp) -> Self {
        Self {
            id: SyncLogId::new(),
            device_id,
            user_id,
            started_at: at,
            finished_at: None,
            status: SyncRunStatus::Started,
            counts: SyncCounts::default(),
            error_message: None,
            duration_ms: None,
            download_cursor: None,
        }
    }

    /// Moves the cursor forward; a lower or missing position is ignored.
    pub fn advance_cursor(&mut self, to: Option<SequenceNumber>) {
        self.download_cursor = self.download_cursor.max(to);
    }

    /// Successful end of a session: `Completed`, or `Partial` when conflicts exist.
    pub fn complete(&mut self, counts: SyncCounts, at: Timestamp) -> Result<(), SyncError> {
        let target = if counts.conflicts > 0 {
            SyncRunStatus::Partial
        } else {
            SyncRunStatus::Completed
        };
        self.finalize(target, counts, None, at)
    }

    /// Failed end of a session.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        counts: SyncCounts,
        at: Timestamp,
    ) -> Result<(), SyncError> {
        self.finalize(SyncRunStatus::Error, counts, Some(message.into()), at)
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }

    fn finalize(
        &mut self,
        target: SyncRunStatus,
        counts: SyncCounts,
        error_message: Option<String>,
        at: Timestamp,
    ) -> Result<(), SyncError> {
        if !self.status.can_transition_to(&target) {
            return Err(SyncError::AlreadyFinalized(self.id));
        }
        self.status = target;
        self.counts = counts;
        self.error_message = error_message;
        self.finished_at = Some(at);
        self.duration_ms = Some(at.millis_since(&self.started_at));
        Ok(())
    }
}
