//! ResolveConflictHandler - Command handler for human conflict decisions.
//!
//! Both records are checked in memory before either is written: the decision
//! must be acceptable to the conflict record and the event must still be in
//! `conflict`. The conflict record is persisted first, then the event is
//! retired to `synced` and receives its sequence number.
//!
//! A resolved record whose event is still in `conflict` means the second
//! write failed. Resolving again finishes the job with the recorded decision.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventError, SyncStatus};
use crate::domain::foundation::{ConflictId, EventId, Timestamp, UserId};
use crate::domain::sync::{ConflictResolution, ResolutionDecision, SyncError};
use crate::ports::{ConflictRepository, EventRepository};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveConflictCommand {
    pub conflict_id: ConflictId,
    #[serde(flatten)]
    pub decision: ResolutionDecision,
    pub resolved_by: Option<UserId>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictSettlement {
    pub conflict: ConflictResolution,
    pub event: AnimalEvent,
}

pub struct ResolveConflictHandler {
    conflicts: Arc<dyn ConflictRepository>,
    events: Arc<dyn EventRepository>,
}

impl ResolveConflictHandler {
    pub fn new(conflicts: Arc<dyn ConflictRepository>, events: Arc<dyn EventRepository>) -> Self {
        Self { conflicts, events }
    }

    pub async fn handle(&self, cmd: ResolveConflictCommand) -> Result<ConflictSettlement, SyncError> {
        let mut conflict = self
            .conflicts
            .find_by_id(&cmd.conflict_id)
            .await?
            .ok_or(SyncError::ConflictNotFound(cmd.conflict_id))?;

        let event_id = EventId::from_uuid(*conflict.entity_id());
        let mut event = self
            .events
            .find_by_id(&event_id)
            .await?
            .ok_or(EventError::NotFound(event_id))?;

        if event.sync_status() != SyncStatus::Conflict {
            if conflict.is_resolved() {
                return Err(SyncError::AlreadyResolved(*conflict.id()));
            }
            return Err(EventError::InvalidSyncTransition {
                from: event.sync_status(),
                to: SyncStatus::Synced,
            }
            .into());
        }

        let now = Timestamp::now();
        let interrupted = conflict.is_resolved();
        if interrupted {
            tracing::warn!(
                conflict_id = %conflict.id(),
                event_id = %event_id,
                strategy = %conflict.strategy(),
                "finishing an interrupted resolution with the recorded decision"
            );
        } else {
            conflict.resolve(cmd.decision, cmd.resolved_by, cmd.notes, now)?;
        }
        event
            .retire_conflict(&conflict, now)
            .map_err(EventError::from)?;

        if !interrupted {
            self.conflicts.update(&conflict).await?;
        }
        let event = match self.events.update_sync_status(&event).await {
            Ok(event) => event,
            Err(err) => {
                tracing::error!(
                    conflict_id = %conflict.id(),
                    event_id = %event_id,
                    error = %err,
                    "conflict resolved but event could not be retired"
                );
                return Err(err.into());
            }
        };

        tracing::info!(
            conflict_id = %conflict.id(),
            event_id = %event.id(),
            strategy = %conflict.strategy(),
            "conflict resolved"
        );

        Ok(ConflictSettlement { conflict, event })
    }
}
