//! GetSyncLogHandler - Query handler for a sync session log.

use std::sync::Arc;

use crate::domain::foundation::SyncLogId;
use crate::domain::sync::{SyncError, SyncRunLog};
use crate::ports::SyncLogRepository;

#[derive(Debug, Clone)]
pub struct GetSyncLogQuery {
    pub sync_log_id: SyncLogId,
}

pub struct GetSyncLogHandler {
    sync_logs: Arc<dyn SyncLogRepository>,
}

impl GetSyncLogHandler {
    pub fn new(sync_logs: Arc<dyn SyncLogRepository>) -> Self {
        Self { sync_logs }
    }

    pub async fn handle(&self, query: GetSyncLogQuery) -> Result<SyncRunLog, SyncError> {
        self.sync_logs
            .find_by_id(&query.sync_log_id)
            .await?
            .ok_or(SyncError::SyncLogNotFound(query.sync_log_id))
    }
}
