//! In-memory sync log repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DeviceId, DomainError, ErrorCode, SyncLogId};
use crate::domain::sync::{SyncRunLog, SyncRunStatus};
use crate::ports::SyncLogRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemorySyncLogRepository {
    logs: Arc<RwLock<HashMap<SyncLogId, SyncRunLog>>>,
}

impl InMemorySyncLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<SyncRunLog> {
        self.logs.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl SyncLogRepository for InMemorySyncLogRepository {
    async fn save(&self, log: &SyncRunLog) -> Result<(), DomainError> {
        self.logs.write().await.insert(log.id, log.clone());
        Ok(())
    }

    async fn update(&self, log: &SyncRunLog) -> Result<(), DomainError> {
        let mut logs = self.logs.write().await;
        let stored = logs.get_mut(&log.id).ok_or_else(|| {
            DomainError::new(ErrorCode::SyncLogNotFound, format!("Sync log not found: {}", log.id))
        })?;
        if stored.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Sync log {} is already finalized", log.id),
            ));
        }
        *stored = log.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &SyncLogId) -> Result<Option<SyncRunLog>, DomainError> {
        Ok(self.logs.read().await.get(id).cloned())
    }

    async fn last_successful(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<SyncRunLog>, DomainError> {
        Ok(self
            .logs
            .read()
            .await
            .values()
            .filter(|l| {
                &l.device_id == device_id
                    && matches!(l.status, SyncRunStatus::Completed | SyncRunStatus::Partial)
            })
            .max_by(|a, b| a.started_at.cmp(&b.started_at))
            .cloned())
    }
}
