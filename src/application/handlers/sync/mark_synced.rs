//! MarkEventsSyncedHandler - Explicit acknowledgement of pending events.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventError, SyncStatus};
use crate::domain::foundation::{EventId, StateMachine, Timestamp};
use crate::ports::EventRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkEventsSyncedCommand {
    pub event_ids: Vec<EventId>,
}

pub struct MarkEventsSyncedHandler {
    repository: Arc<dyn EventRepository>,
}

impl MarkEventsSyncedHandler {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    /// Every event is loaded and checked before the first write.
    ///
    /// Events already synced are returned as stored; a conflict can only be
    /// left through its resolution record.
    pub async fn handle(&self, cmd: MarkEventsSyncedCommand) -> Result<Vec<AnimalEvent>, EventError> {
        if cmd.event_ids.is_empty() {
            return Err(EventError::EmptyBatch);
        }

        let now = Timestamp::now();
        let mut loaded = Vec::with_capacity(cmd.event_ids.len());
        for id in &cmd.event_ids {
            let mut event = self
                .repository
                .find_by_id(id)
                .await?
                .ok_or(EventError::NotFound(*id))?;
            let status = event.sync_status();
            if status == SyncStatus::Synced {
                loaded.push((event, false));
                continue;
            }
            if !status.can_transition_to(&SyncStatus::Synced) {
                return Err(EventError::InvalidSyncTransition {
                    from: status,
                    to: SyncStatus::Synced,
                });
            }
            event.mark_synced(now)?;
            loaded.push((event, true));
        }

        let mut acknowledged = Vec::with_capacity(loaded.len());
        for (event, changed) in loaded {
            if changed {
                acknowledged.push(self.repository.update_sync_status(&event).await?);
            } else {
                acknowledged.push(event);
            }
        }

        tracing::info!(count = acknowledged.len(), "events acknowledged as synced");
        Ok(acknowledged)
    }
}
