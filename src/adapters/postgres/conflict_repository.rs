//! PostgreSQL implementation of ConflictRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::column;
use crate::domain::foundation::{ConflictId, DomainError, ErrorCode, SyncLogId, Timestamp, UserId};
use crate::domain::sync::{ConflictResolution, ConflictResolutionParts, ResolutionStrategy};
use crate::ports::ConflictRepository;

const SELECT_CONFLICTS: &str = r#"
    SELECT id, sync_log_id, entity_type, entity_id, server_version, client_version,
           strategy, merged_version, resolved_by, resolved_at, notes, created_at
    FROM conflict_resolutions
"#;

#[derive(Clone)]
pub struct PostgresConflictRepository {
    pool: PgPool,
}

impl PostgresConflictRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(
        &self,
        sql: String,
        bind: Uuid,
        context: &str,
    ) -> Result<Vec<ConflictResolution>, DomainError> {
        let rows = sqlx::query(&sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(context, e))?;
        rows.iter().map(row_to_conflict).collect()
    }
}

#[async_trait]
impl ConflictRepository for PostgresConflictRepository {
    async fn save(&self, conflict: &ConflictResolution) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conflict_resolutions (
                id, sync_log_id, entity_type, entity_id, server_version, client_version,
                strategy, merged_version, resolved_by, resolved_at, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(conflict.id().as_uuid())
        .bind(conflict.sync_log_id().as_uuid())
        .bind(conflict.entity_type())
        .bind(conflict.entity_id())
        .bind(Json(conflict.server_version()))
        .bind(Json(conflict.client_version()))
        .bind(conflict.strategy().as_str())
        .bind(conflict.merged_version().map(Json))
        .bind(conflict.resolved_by().map(|u| u.as_str()))
        .bind(conflict.resolved_at().map(|t| *t.as_datetime()))
        .bind(conflict.notes())
        .bind(conflict.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert conflict", e))?;

        Ok(())
    }

    async fn update(&self, conflict: &ConflictResolution) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE conflict_resolutions SET
                strategy = $2,
                merged_version = $3,
                resolved_by = $4,
                resolved_at = $5,
                notes = $6
            WHERE id = $1 AND resolved_at IS NULL
            "#,
        )
        .bind(conflict.id().as_uuid())
        .bind(conflict.strategy().as_str())
        .bind(conflict.merged_version().map(Json))
        .bind(conflict.resolved_by().map(|u| u.as_str()))
        .bind(conflict.resolved_at().map(|t| *t.as_datetime()))
        .bind(conflict.notes())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update conflict", e))?;

        if result.rows_affected() == 0 {
            return Err(match self.find_by_id(conflict.id()).await? {
                None => DomainError::new(
                    ErrorCode::ConflictNotFound,
                    format!("Conflict not found: {}", conflict.id()),
                ),
                Some(_) => DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("Conflict {} is already resolved", conflict.id()),
                ),
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &ConflictId) -> Result<Option<ConflictResolution>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_CONFLICTS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch conflict", e))?;
        row.as_ref().map(row_to_conflict).transpose()
    }

    async fn find_open(&self, limit: u32) -> Result<Vec<ConflictResolution>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE resolved_at IS NULL ORDER BY created_at ASC LIMIT $1",
            SELECT_CONFLICTS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list open conflicts", e))?;
        rows.iter().map(row_to_conflict).collect()
    }

    async fn find_by_sync_log(
        &self,
        sync_log_id: &SyncLogId,
    ) -> Result<Vec<ConflictResolution>, DomainError> {
        self.fetch_many(
            format!("{} WHERE sync_log_id = $1 ORDER BY created_at ASC", SELECT_CONFLICTS),
            *sync_log_id.as_uuid(),
            "Failed to list conflicts by sync log",
        )
        .await
    }

    async fn find_by_entity(
        &self,
        entity_id: &Uuid,
    ) -> Result<Vec<ConflictResolution>, DomainError> {
        self.fetch_many(
            format!("{} WHERE entity_id = $1 ORDER BY created_at ASC", SELECT_CONFLICTS),
            *entity_id,
            "Failed to list conflicts by entity",
        )
        .await
    }
}

fn row_to_conflict(row: &PgRow) -> Result<ConflictResolution, DomainError> {
    let strategy: String = column(row, "strategy")?;
    let strategy: ResolutionStrategy = strategy
        .parse()
        .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("{}", e)))?;
    let Json(server_version): Json<Value> = column(row, "server_version")?;
    let Json(client_version): Json<Value> = column(row, "client_version")?;
    let merged_version: Option<Json<Value>> = column(row, "merged_version")?;
    let resolved_by: Option<String> = column(row, "resolved_by")?;
    let resolved_at: Option<DateTime<Utc>> = column(row, "resolved_at")?;

    Ok(ConflictResolution::reconstitute(ConflictResolutionParts {
        id: ConflictId::from_uuid(column(row, "id")?),
        sync_log_id: SyncLogId::from_uuid(column(row, "sync_log_id")?),
        entity_type: column(row, "entity_type")?,
        entity_id: column(row, "entity_id")?,
        server_version,
        client_version,
        strategy,
        merged_version: merged_version.map(|Json(v)| v),
        resolved_by: resolved_by.map(UserId::new).transpose()?,
        resolved_at: resolved_at.map(Timestamp::from_datetime),
        notes: column(row, "notes")?,
        created_at: Timestamp::from_datetime(column(row, "created_at")?),
    }))
}
