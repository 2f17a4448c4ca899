//! PostgreSQL implementation of EventRepository and EventReader.
//!
//! Base rows live in `animal_events`; the variant detail is a JSONB row in
//! `animal_event_details`, written in the same transaction as its event.
//! Sequence numbers come from `animal_event_sequence` when an event first
//! reaches `synced`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::column;
use crate::domain::event::{
    AnimalEvent, EventDetail, EventKind, EventMetadata, EventRecord, EventTypeCode, GpsLocation,
    SyncStatus,
};
use crate::domain::foundation::{
    AnimalId, DeviceId, DomainError, ErrorCode, EventId, FarmId, LotId, OfflineId, PaddockId,
    SequenceNumber, StateMachine, Timestamp, UserId,
};
use crate::ports::{
    EventFilter, EventReader, EventRepository, Page, PageRequest, ReproductionProjection,
    WeighingProjection,
};

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_EVENTS: &str = r#"
    SELECT e.id, e.sequence_number, e.animal_id, e.user_id, e.event_date,
           e.local_registration_date, e.sync_date, e.event_type, e.category,
           e.farm_id, e.lot_id, e.paddock_id, e.gps_location, e.device_id,
           e.offline_id, e.is_manual, e.observations, e.metadata, e.sync_status,
           d.payload AS detail
    FROM animal_events e
    LEFT JOIN animal_event_details d ON d.event_id = e.id
"#;

#[derive(Clone)]
pub struct PostgresEventLedger {
    pool: PgPool,
}

impl PostgresEventLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        event: &AnimalEvent,
    ) -> Result<(), DomainError> {
        let record = event.as_record();
        sqlx::query(
            r#"
            INSERT INTO animal_events (
                id, animal_id, user_id, event_date, local_registration_date, sync_date,
                event_type, category, farm_id, lot_id, paddock_id, gps_location,
                device_id, offline_id, is_manual, observations, metadata, sync_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.animal_id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.event_date.as_datetime())
        .bind(record.local_registration_date.as_datetime())
        .bind(record.sync_date.map(|t| *t.as_datetime()))
        .bind(record.event_type.as_str())
        .bind(record.category.as_str())
        .bind(record.farm_id.map(|id| *id.as_uuid()))
        .bind(record.lot_id.map(|id| *id.as_uuid()))
        .bind(record.paddock_id.map(|id| *id.as_uuid()))
        .bind(record.gps_location.as_ref().map(|g| g.as_str()))
        .bind(record.device_id.as_ref().map(|d| d.as_str()))
        .bind(record.offline_id.as_ref().map(|o| o.as_str()))
        .bind(record.is_manual)
        .bind(record.observations.as_deref())
        .bind(Json(&record.metadata))
        .bind(record.sync_status.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| insert_error(e, record.offline_id.as_ref()))?;

        if let Some(detail) = &record.detail {
            sqlx::query(
                "INSERT INTO animal_event_details (event_id, kind, payload) VALUES ($1, $2, $3)",
            )
            .bind(record.id.as_uuid())
            .bind(detail.kind().as_str())
            .bind(Json(detail))
            .execute(&mut **tx)
            .await
            .map_err(|e| DomainError::database("Failed to insert event detail", e))?;
        }

        Ok(())
    }

    async fn fetch_by_id_in(
        tx: &mut Transaction<'_, Postgres>,
        id: &EventId,
    ) -> Result<Option<AnimalEvent>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE e.id = $1", SELECT_EVENTS))
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| DomainError::database("Failed to fetch event", e))?;
        row.as_ref().map(row_to_event).transpose()
    }

    async fn latest_detail_before(
        &self,
        animal_id: &AnimalId,
        kind: EventKind,
        before: &Timestamp,
    ) -> Result<Option<(EventId, Timestamp, EventDetail)>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT e.id, e.event_date, d.payload
            FROM animal_events e
            JOIN animal_event_details d ON d.event_id = e.id
            WHERE e.animal_id = $1 AND d.kind = $2 AND e.event_date < $3
            ORDER BY e.event_date DESC
            LIMIT 1
            "#,
        )
        .bind(animal_id.as_uuid())
        .bind(kind.as_str())
        .bind(before.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch previous event", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Json(detail): Json<EventDetail> = column(&row, "payload")?;
        Ok(Some((
            EventId::from_uuid(column(&row, "id")?),
            Timestamp::from_datetime(column(&row, "event_date")?),
            detail,
        )))
    }

    async fn fetch_all(
        &self,
        mut query: QueryBuilder<'_, Postgres>,
        context: &str,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(context, e))?;
        rows.iter().map(row_to_event).collect()
    }

    async fn count(&self, mut query: QueryBuilder<'_, Postgres>) -> Result<u64, DomainError> {
        let (total,): (i64,) = query
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to count events", e))?;
        Ok(total as u64)
    }
}

#[async_trait]
impl EventRepository for PostgresEventLedger {
    async fn insert(&self, event: &AnimalEvent) -> Result<(), DomainError> {
        self.insert_batch(std::slice::from_ref(event)).await
    }

    async fn insert_batch(&self, events: &[AnimalEvent]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;
        for event in events {
            Self::insert_in(&mut tx, event).await?;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit events", e))
    }

    async fn update_sync_status(&self, event: &AnimalEvent) -> Result<AnimalEvent, DomainError> {
        let target = event.sync_status();
        let allowed: Vec<&'static str> = predecessors(target).iter().map(|s| s.as_str()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE animal_events SET
                sync_status = $2,
                sync_date = $3,
                sequence_number = CASE
                    WHEN $2 = 'synced' AND sequence_number IS NULL
                        THEN nextval('animal_event_sequence')
                    ELSE sequence_number
                END
            WHERE id = $1 AND sync_status = ANY($4)
            "#,
        )
        .bind(event.id().as_uuid())
        .bind(target.as_str())
        .bind(event.sync_date().map(|t| *t.as_datetime()))
        .bind(allowed)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to update sync status", e))?;

        if result.rows_affected() == 0 {
            let stored = Self::fetch_by_id_in(&mut tx, event.id()).await?;
            return Err(match stored {
                None => DomainError::new(
                    ErrorCode::EventNotFound,
                    format!("Event not found: {}", event.id()),
                ),
                Some(stored) => DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!(
                        "Cannot change sync status from {} to {}",
                        stored.sync_status(),
                        target
                    ),
                ),
            });
        }

        let updated = Self::fetch_by_id_in(&mut tx, event.id())
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::EventNotFound, "Event vanished during update"))?;
        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit sync status", e))?;
        Ok(updated)
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<AnimalEvent>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE e.id = $1", SELECT_EVENTS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch event", e))?;
        row.as_ref().map(row_to_event).transpose()
    }

    async fn find_by_offline_id(
        &self,
        offline_id: &OfflineId,
    ) -> Result<Option<AnimalEvent>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE e.offline_id = $1", SELECT_EVENTS))
            .bind(offline_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch event by offline id", e))?;
        row.as_ref().map(row_to_event).transpose()
    }

    async fn existing_offline_ids(
        &self,
        offline_ids: &[OfflineId],
    ) -> Result<Vec<OfflineId>, DomainError> {
        let wanted: Vec<&str> = offline_ids.iter().map(|o| o.as_str()).collect();
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT offline_id FROM animal_events WHERE offline_id = ANY($1)")
                .bind(wanted)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to check offline ids", e))?;
        rows.into_iter()
            .map(|(id,)| OfflineId::new(id).map_err(DomainError::from))
            .collect()
    }
}

#[async_trait]
impl EventReader for PostgresEventLedger {
    async fn find_by_animal(
        &self,
        animal_id: &AnimalId,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM animal_events e WHERE e.animal_id = ");
        count.push_bind(*animal_id.as_uuid());
        let total = self.count(count).await?;

        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query.push(" WHERE e.animal_id = ").push_bind(*animal_id.as_uuid());
        push_page(&mut query, page);
        let items = self.fetch_all(query, "Failed to list animal events").await?;
        Ok(Page::new(items, total, page))
    }

    async fn find_by_animal_and_type(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query
            .push(" WHERE e.animal_id = ")
            .push_bind(*animal_id.as_uuid())
            .push(" AND e.event_type = ")
            .push_bind(event_type.as_str().to_string())
            .push(" ORDER BY e.event_date ASC");
        self.fetch_all(query, "Failed to list events by type").await
    }

    async fn find_by_farm(
        &self,
        farm_id: &FarmId,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM animal_events e WHERE e.farm_id = ");
        count.push_bind(*farm_id.as_uuid());
        push_filter(&mut count, filter);
        let total = self.count(count).await?;

        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query.push(" WHERE e.farm_id = ").push_bind(*farm_id.as_uuid());
        push_filter(&mut query, filter);
        push_page(&mut query, page);
        let items = self.fetch_all(query, "Failed to list farm events").await?;
        Ok(Page::new(items, total, page))
    }

    async fn find_pending_sync(
        &self,
        device_id: Option<&DeviceId>,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query.push(" WHERE e.sync_status = 'pending'");
        if let Some(device_id) = device_id {
            query
                .push(" AND e.device_id = ")
                .push_bind(device_id.as_str().to_string());
        }
        query.push(" ORDER BY e.local_registration_date ASC");
        self.fetch_all(query, "Failed to list pending events").await
    }

    async fn last_weighing(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<WeighingProjection>, DomainError> {
        let latest = self
            .latest_detail_before(animal_id, EventKind::Weighing, before)
            .await?;
        Ok(latest.and_then(|(event_id, event_date, detail)| {
            detail.as_weighing().map(|w| WeighingProjection {
                event_id,
                event_date,
                weight: w.weight,
            })
        }))
    }

    async fn last_reproduction(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<ReproductionProjection>, DomainError> {
        let latest = self
            .latest_detail_before(animal_id, EventKind::Reproduction, before)
            .await?;
        Ok(latest.and_then(|(event_id, event_date, detail)| {
            detail.as_reproduction().map(|r| ReproductionProjection {
                event_id,
                event_date,
                service_type: r.service_type,
                result: r.result,
                attempt_number: r.attempt_number,
                estimated_birth_date: r.estimated_birth_date,
            })
        }))
    }

    async fn find_same_fact(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
        event_date: &Timestamp,
        excluding: &[EventId],
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let excluded: Vec<Uuid> = excluding.iter().map(|id| *id.as_uuid()).collect();
        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query
            .push(" WHERE e.animal_id = ")
            .push_bind(*animal_id.as_uuid())
            .push(" AND e.event_type = ")
            .push_bind(event_type.as_str().to_string())
            .push(" AND e.event_date = ")
            .push_bind(*event_date.as_datetime())
            .push(" AND NOT (e.id = ANY(")
            .push_bind(excluded)
            .push("))");
        self.fetch_all(query, "Failed to look up matching events").await
    }

    async fn find_synced_after(
        &self,
        after: Option<SequenceNumber>,
        excluding_device: &DeviceId,
        limit: u32,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut query = QueryBuilder::new(SELECT_EVENTS);
        query
            .push(" WHERE e.sync_status = 'synced' AND e.device_id IS DISTINCT FROM ")
            .push_bind(excluding_device.as_str().to_string());
        if let Some(after) = after {
            query.push(" AND e.sequence_number > ").push_bind(after.value());
        }
        query
            .push(" ORDER BY e.sequence_number ASC LIMIT ")
            .push_bind(i64::from(limit));
        self.fetch_all(query, "Failed to list synced events").await
    }
}

/// Statuses from which the store accepts a move to `target`.
fn predecessors(target: SyncStatus) -> Vec<SyncStatus> {
    [SyncStatus::Pending, SyncStatus::Synced, SyncStatus::Conflict]
        .into_iter()
        .filter(|from| {
            from.can_transition_to(&target)
                || (*from == SyncStatus::Conflict && target == SyncStatus::Synced)
        })
        .collect()
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    if let Some(event_type) = &filter.event_type {
        query
            .push(" AND e.event_type = ")
            .push_bind(event_type.as_str().to_string());
    }
    if let Some(category) = filter.category {
        query.push(" AND e.category = ").push_bind(category.as_str());
    }
    if let Some(status) = filter.sync_status {
        query.push(" AND e.sync_status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        query.push(" AND e.event_date >= ").push_bind(*from.as_datetime());
    }
    if let Some(until) = filter.until {
        query.push(" AND e.event_date < ").push_bind(*until.as_datetime());
    }
}

fn push_page(query: &mut QueryBuilder<'_, Postgres>, page: &PageRequest) {
    query
        .push(" ORDER BY e.event_date DESC LIMIT ")
        .push_bind(page.limit() as i64)
        .push(" OFFSET ")
        .push_bind(page.offset() as i64);
}

fn insert_error(err: sqlx::Error, offline_id: Option<&OfflineId>) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db.constraint() == Some("animal_events_offline_id_key")
        {
            let mut dup = DomainError::new(
                ErrorCode::DuplicateOfflineId,
                "Event with this offlineId already exists",
            );
            if let Some(offline_id) = offline_id {
                dup = dup.with_detail("offline_id", offline_id.as_str());
            }
            return dup;
        }
    }
    DomainError::database("Failed to insert event", err)
}

fn row_to_event(row: &PgRow) -> Result<AnimalEvent, DomainError> {
    let sequence_number: Option<i64> = column(row, "sequence_number")?;
    let sync_date: Option<DateTime<Utc>> = column(row, "sync_date")?;
    let category: String = column(row, "category")?;
    let sync_status: String = column(row, "sync_status")?;
    let farm_id: Option<Uuid> = column(row, "farm_id")?;
    let lot_id: Option<Uuid> = column(row, "lot_id")?;
    let paddock_id: Option<Uuid> = column(row, "paddock_id")?;
    let gps_location: Option<String> = column(row, "gps_location")?;
    let device_id: Option<String> = column(row, "device_id")?;
    let offline_id: Option<String> = column(row, "offline_id")?;
    let Json(metadata): Json<EventMetadata> = column(row, "metadata")?;
    let detail: Option<Json<EventDetail>> = column(row, "detail")?;

    let record = EventRecord {
        id: EventId::from_uuid(column(row, "id")?),
        sequence_number: sequence_number.map(SequenceNumber::new).transpose()?,
        animal_id: AnimalId::from_uuid(column(row, "animal_id")?),
        user_id: UserId::new(column::<String>(row, "user_id")?)?,
        event_date: Timestamp::from_datetime(column(row, "event_date")?),
        local_registration_date: Timestamp::from_datetime(column(row, "local_registration_date")?),
        sync_date: sync_date.map(Timestamp::from_datetime),
        event_type: EventTypeCode::new(column::<String>(row, "event_type")?)?,
        category: category.parse()?,
        farm_id: farm_id.map(FarmId::from_uuid),
        lot_id: lot_id.map(LotId::from_uuid),
        paddock_id: paddock_id.map(PaddockId::from_uuid),
        gps_location: gps_location.map(GpsLocation::new).transpose()?,
        device_id: device_id.map(DeviceId::new).transpose()?,
        offline_id: offline_id.map(OfflineId::new).transpose()?,
        is_manual: column(row, "is_manual")?,
        observations: column(row, "observations")?,
        metadata,
        sync_status: sync_status.parse()?,
        detail: detail.map(|Json(d)| d),
    };
    Ok(AnimalEvent::reconstitute(record))
}
