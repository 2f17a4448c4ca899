//! Synchronization status of a ledger event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle flag tracking whether the server has accepted an event.
///
/// Transitions are monotone: `Pending -> Synced` or `Pending -> Conflict`.
/// A `Conflict` only leaves that state through a resolved conflict record
/// (see `AnimalEvent::retire_conflict`), never through `transition_to`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Created locally, not yet acknowledged.
    #[default]
    Pending,
    /// Accepted by the server; a sequence number has been assigned.
    Synced,
    /// The server holds a divergent fact for the same logical event.
    Conflict,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::Conflict => "conflict",
        }
    }
}

impl StateMachine for SyncStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SyncStatus::*;
        matches!((self, target), (Pending, Synced) | (Pending, Conflict))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SyncStatus::*;
        match self {
            Pending => vec![Synced, Conflict],
            Synced | Conflict => vec![],
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "synced" => Ok(SyncStatus::Synced),
            "conflict" => Ok(SyncStatus::Conflict),
            other => Err(ValidationError::invalid_format(
                "sync_status",
                format!("unknown sync status '{}'", other),
            )),
        }
    }
}
