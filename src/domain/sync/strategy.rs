//! Conflict resolution strategies and the configured policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::SyncError;

/// How a divergent record is, or will be, settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Deferred to a human; read-only until a resolver signs off.
    #[default]
    AdminDecides,
    ServerWins,
    ClientWins,
    /// Human-supplied merged payload. No automatic merge exists.
    Merge,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::AdminDecides => "admin_decides",
            ResolutionStrategy::ServerWins => "server_wins",
            ResolutionStrategy::ClientWins => "client_wins",
            ResolutionStrategy::Merge => "merge",
        }
    }

    /// Strategies that can settle a record without a human.
    pub fn is_automatic(&self) -> bool {
        matches!(self, ResolutionStrategy::ServerWins | ResolutionStrategy::ClientWins)
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin_decides" => Ok(ResolutionStrategy::AdminDecides),
            "server_wins" => Ok(ResolutionStrategy::ServerWins),
            "client_wins" => Ok(ResolutionStrategy::ClientWins),
            "merge" => Ok(ResolutionStrategy::Merge),
            other => Err(SyncError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Strategy stamped onto new conflicts during a sync session.
///
/// Excludes `Merge`, which needs a human payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    AdminDecides,
    ServerWins,
    ClientWins,
}

impl ConflictPolicy {
    pub fn strategy(&self) -> ResolutionStrategy {
        match self {
            ConflictPolicy::AdminDecides => ResolutionStrategy::AdminDecides,
            ConflictPolicy::ServerWins => ResolutionStrategy::ServerWins,
            ConflictPolicy::ClientWins => ResolutionStrategy::ClientWins,
        }
    }
}

/// A human decision applied to an open conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ResolutionDecision {
    ServerWins,
    ClientWins,
    Merge { merged_version: serde_json::Value },
}

impl ResolutionDecision {
    pub fn strategy(&self) -> ResolutionStrategy {
        match self {
            ResolutionDecision::ServerWins => ResolutionStrategy::ServerWins,
            ResolutionDecision::ClientWins => ResolutionStrategy::ClientWins,
            ResolutionDecision::Merge { .. } => ResolutionStrategy::Merge,
        }
    }
}
