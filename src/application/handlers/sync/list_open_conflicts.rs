//! ListOpenConflictsHandler - Conflicts still waiting for a decision.

use std::sync::Arc;

use crate::domain::foundation::{EventId, SyncLogId};
use crate::domain::sync::{ConflictResolution, SyncError};
use crate::ports::{ConflictRepository, MAX_PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct ListOpenConflictsQuery {
    /// Only conflicts raised for this event.
    pub event_id: Option<EventId>,
    /// Only conflicts raised during this session.
    pub sync_log_id: Option<SyncLogId>,
    pub limit: u32,
}

impl Default for ListOpenConflictsQuery {
    fn default() -> Self {
        Self {
            event_id: None,
            sync_log_id: None,
            limit: 50,
        }
    }
}

pub struct ListOpenConflictsHandler {
    conflicts: Arc<dyn ConflictRepository>,
}

impl ListOpenConflictsHandler {
    pub fn new(conflicts: Arc<dyn ConflictRepository>) -> Self {
        Self { conflicts }
    }

    pub async fn handle(&self, query: ListOpenConflictsQuery) -> Result<Vec<ConflictResolution>, SyncError> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let mut open = match (query.event_id, query.sync_log_id) {
            (Some(event_id), _) => self.conflicts.find_by_entity(event_id.as_uuid()).await?,
            (None, Some(sync_log_id)) => self.conflicts.find_by_sync_log(&sync_log_id).await?,
            (None, None) => self.conflicts.find_open(limit).await?,
        };
        open.retain(|c| !c.is_resolved());
        open.truncate(limit as usize);
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryConflictRepository;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::sync::{ResolutionDecision, ResolutionStrategy};
    use serde_json::json;

    fn conflict(sync_log_id: SyncLogId) -> ConflictResolution {
        ConflictResolution::open(
            sync_log_id,
            *EventId::new().as_uuid(),
            json!({"v": 1}),
            json!({"v": 2}),
            ResolutionStrategy::AdminDecides,
        )
    }

    #[tokio::test]
    async fn resolved_conflicts_are_hidden() {
        let repo = Arc::new(InMemoryConflictRepository::new());
        let session = SyncLogId::new();
        let open = conflict(session);
        let mut settled = conflict(session);
        repo.save(&open).await.unwrap();
        repo.save(&settled).await.unwrap();
        settled
            .resolve(
                ResolutionDecision::ServerWins,
                Some(UserId::new("admin-1").unwrap()),
                None,
                Timestamp::now(),
            )
            .unwrap();
        repo.update(&settled).await.unwrap();
        repo.save(&conflict(SyncLogId::new())).await.unwrap();

        let handler = ListOpenConflictsHandler::new(repo);
        let all = handler.handle(ListOpenConflictsQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_session = handler
            .handle(ListOpenConflictsQuery {
                sync_log_id: Some(session),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_session.len(), 1);
        assert_eq!(by_session[0].id(), open.id());
    }

    #[tokio::test]
    async fn filters_by_event() {
        let repo = Arc::new(InMemoryConflictRepository::new());
        let target = conflict(SyncLogId::new());
        repo.save(&target).await.unwrap();
        repo.save(&conflict(SyncLogId::new())).await.unwrap();

        let found = ListOpenConflictsHandler::new(repo)
            .handle(ListOpenConflictsQuery {
                event_id: Some(EventId::from_uuid(*target.entity_id())),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
