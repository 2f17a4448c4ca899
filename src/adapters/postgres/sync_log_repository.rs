//! PostgreSQL implementation of SyncLogRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

use super::column;
use crate::domain::foundation::{
    DeviceId, DomainError, ErrorCode, SequenceNumber, SyncLogId, Timestamp, UserId,
};
use crate::domain::sync::{SyncCounts, SyncRunLog};
use crate::ports::SyncLogRepository;

const SELECT_LOGS: &str = r#"
    SELECT id, device_id, user_id, started_at, finished_at, status,
           uploaded, downloaded, conflicts, error_message, duration_ms,
           download_cursor
    FROM sync_logs
"#;

#[derive(Clone)]
pub struct PostgresSyncLogRepository {
    pool: PgPool,
}

impl PostgresSyncLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncLogRepository for PostgresSyncLogRepository {
    async fn save(&self, log: &SyncRunLog) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sync_logs (
                id, device_id, user_id, started_at, finished_at, status,
                uploaded, downloaded, conflicts, error_message, duration_ms,
                download_cursor
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.device_id.as_str())
        .bind(log.user_id.as_str())
        .bind(log.started_at.as_datetime())
        .bind(log.finished_at.map(|t| *t.as_datetime()))
        .bind(log.status.as_str())
        .bind(log.counts.uploaded as i32)
        .bind(log.counts.downloaded as i32)
        .bind(log.counts.conflicts as i32)
        .bind(log.error_message.as_deref())
        .bind(log.duration_ms.map(|ms| ms as i64))
        .bind(log.download_cursor.map(|seq| seq.value()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert sync log", e))?;

        Ok(())
    }

    async fn update(&self, log: &SyncRunLog) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sync_logs SET
                finished_at = $2,
                status = $3,
                uploaded = $4,
                downloaded = $5,
                conflicts = $6,
                error_message = $7,
                duration_ms = $8,
                download_cursor = $9
            WHERE id = $1 AND status = 'started'
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.finished_at.map(|t| *t.as_datetime()))
        .bind(log.status.as_str())
        .bind(log.counts.uploaded as i32)
        .bind(log.counts.downloaded as i32)
        .bind(log.counts.conflicts as i32)
        .bind(log.error_message.as_deref())
        .bind(log.duration_ms.map(|ms| ms as i64))
        .bind(log.download_cursor.map(|seq| seq.value()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update sync log", e))?;

        if result.rows_affected() == 0 {
            return Err(match self.find_by_id(&log.id).await? {
                None => DomainError::new(
                    ErrorCode::SyncLogNotFound,
                    format!("Sync log not found: {}", log.id),
                ),
                Some(_) => DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Sync log {} is already finalized", log.id),
                ),
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &SyncLogId) -> Result<Option<SyncRunLog>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_LOGS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch sync log", e))?;
        row.as_ref().map(row_to_log).transpose()
    }

    async fn last_successful(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<SyncRunLog>, DomainError> {
        let row = sqlx::query(&format!(
            "{} WHERE device_id = $1 AND status IN ('completed', 'partial') ORDER BY started_at DESC LIMIT 1",
            SELECT_LOGS
        ))
        .bind(device_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch last sync log", e))?;
        row.as_ref().map(row_to_log).transpose()
    }
}

fn row_to_log(row: &PgRow) -> Result<SyncRunLog, DomainError> {
    let finished_at: Option<DateTime<Utc>> = column(row, "finished_at")?;
    let status: String = column(row, "status")?;
    let duration_ms: Option<i64> = column(row, "duration_ms")?;
    let download_cursor: Option<i64> = column(row, "download_cursor")?;

    Ok(SyncRunLog {
        id: SyncLogId::from_uuid(column(row, "id")?),
        device_id: DeviceId::new(column::<String>(row, "device_id")?)?,
        user_id: UserId::new(column::<String>(row, "user_id")?)?,
        started_at: Timestamp::from_datetime(column(row, "started_at")?),
        finished_at: finished_at.map(Timestamp::from_datetime),
        status: status.parse()?,
        counts: SyncCounts {
            uploaded: column::<i32>(row, "uploaded")? as u32,
            downloaded: column::<i32>(row, "downloaded")? as u32,
            conflicts: column::<i32>(row, "conflicts")? as u32,
        },
        error_message: column(row, "error_message")?,
        duration_ms: duration_ms.map(|ms| ms as u64),
        download_cursor: download_cursor.map(SequenceNumber::new).transpose()?,
    })
}
