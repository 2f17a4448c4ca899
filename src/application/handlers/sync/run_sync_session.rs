//! RunSyncSessionHandler - One device synchronization session.
//!
//! Opens a run log, ingests the device queue, reconciles every accepted event
//! against facts already in the ledger, collects downloads and finalizes the
//! log exactly once.
//!
//! # Reconciliation
//!
//! An event whose logical key (animal, type code, event date) matches a stored
//! event with a different payload fingerprint becomes a conflict. Everything
//! else is marked synced and receives its sequence number from the store.
//! Automatic policies settle the conflict on the spot.
//!
//! The conflict record is written before the event is flagged. Events of the
//! device still `pending` from an interrupted session are reconciled again,
//! reusing any record the interrupted run already wrote.
//!
//! # Downloads
//!
//! Downloads are paged by sequence number. The log keeps the highest position
//! handed out and the next session resumes after it; `has_more` tells the
//! device another session is needed to catch up.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::handlers::events::{BulkRegisterEventsHandler, QueuedEvent};
use crate::domain::event::{AnimalEvent, EventError};
use crate::domain::foundation::{DeviceId, EventId, SequenceNumber, SyncLogId, Timestamp, UserId};
use crate::domain::metrics::GestationCalculator;
use crate::domain::sync::{
    diverges, snapshot, ConflictPolicy, ConflictResolution, SyncCounts, SyncError, SyncRunLog,
};
use crate::ports::{
    ConflictRepository, EventReader, EventRepository, EventTypeRegistry, SyncLogRepository,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSyncSessionCommand {
    pub device_id: DeviceId,
    pub user_id: UserId,
    /// The device's offline queue; may be empty for a download-only session.
    #[serde(default)]
    pub events: Vec<QueuedEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSessionOutcome {
    pub log: SyncRunLog,
    /// Uploaded events after reconciliation: leftovers of interrupted
    /// sessions first, then the queue in order.
    pub accepted: Vec<AnimalEvent>,
    pub conflicts: Vec<ConflictResolution>,
    /// Events synced elsewhere after the device's download cursor.
    pub downloads: Vec<AnimalEvent>,
    /// More downloads are waiting beyond this page.
    pub has_more: bool,
}

struct Exchange {
    accepted: Vec<AnimalEvent>,
    conflicts: Vec<ConflictResolution>,
    downloads: Vec<AnimalEvent>,
    has_more: bool,
}

pub struct RunSyncSessionHandler {
    repository: Arc<dyn EventRepository>,
    reader: Arc<dyn EventReader>,
    sync_logs: Arc<dyn SyncLogRepository>,
    conflicts: Arc<dyn ConflictRepository>,
    ingestion: BulkRegisterEventsHandler,
    policy: ConflictPolicy,
    max_batch_size: usize,
}

impl RunSyncSessionHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        reader: Arc<dyn EventReader>,
        registry: Arc<dyn EventTypeRegistry>,
        sync_logs: Arc<dyn SyncLogRepository>,
        conflicts: Arc<dyn ConflictRepository>,
        policy: ConflictPolicy,
        max_batch_size: usize,
    ) -> Self {
        Self {
            ingestion: BulkRegisterEventsHandler::new(
                repository.clone(),
                reader.clone(),
                registry,
                max_batch_size,
            ),
            repository,
            reader,
            sync_logs,
            conflicts,
            policy,
            max_batch_size,
        }
    }

    /// Gestation used to estimate birth dates of queued services.
    pub fn with_gestation(mut self, gestation: GestationCalculator) -> Self {
        self.ingestion = self.ingestion.with_gestation(gestation);
        self
    }

    pub async fn handle(&self, cmd: RunSyncSessionCommand) -> Result<SyncSessionOutcome, SyncError> {
        let cursor = self
            .sync_logs
            .last_successful(&cmd.device_id)
            .await?
            .and_then(|previous| previous.download_cursor);

        let mut log = SyncRunLog::start(cmd.device_id.clone(), cmd.user_id, Timestamp::now());
        log.advance_cursor(cursor);
        self.sync_logs.save(&log).await?;
        tracing::info!(
            sync_log_id = %log.id,
            device_id = %log.device_id,
            queued = cmd.events.len(),
            cursor = ?cursor.map(|c| c.value()),
            "sync session started"
        );

        let mut counts = SyncCounts::default();
        let result = self
            .exchange(log.id, &cmd.device_id, cursor, cmd.events, &mut counts)
            .await;

        match result {
            Ok(exchange) => {
                log.advance_cursor(exchange.downloads.last().and_then(|e| e.sequence_number()));
                log.complete(counts, Timestamp::now())?;
                self.sync_logs.update(&log).await?;
                tracing::info!(
                    sync_log_id = %log.id,
                    device_id = %log.device_id,
                    status = %log.status,
                    uploaded = counts.uploaded,
                    downloaded = counts.downloaded,
                    conflicts = counts.conflicts,
                    has_more = exchange.has_more,
                    "sync session finished"
                );
                Ok(SyncSessionOutcome {
                    log,
                    accepted: exchange.accepted,
                    conflicts: exchange.conflicts,
                    downloads: exchange.downloads,
                    has_more: exchange.has_more,
                })
            }
            Err(err) => {
                log.fail(err.to_string(), counts, Timestamp::now())?;
                if let Err(update_err) = self.sync_logs.update(&log).await {
                    tracing::error!(sync_log_id = %log.id, error = %update_err, "failed to finalize sync log");
                }
                tracing::error!(
                    sync_log_id = %log.id,
                    device_id = %log.device_id,
                    error = %err,
                    "sync session failed"
                );
                Err(err)
            }
        }
    }

    async fn exchange(
        &self,
        sync_log_id: SyncLogId,
        device_id: &DeviceId,
        cursor: Option<SequenceNumber>,
        queue: Vec<QueuedEvent>,
        counts: &mut SyncCounts,
    ) -> Result<Exchange, SyncError> {
        let queue = self.drop_already_stored(device_id, queue).await?;

        let mut uploads = self.reader.find_pending_sync(Some(device_id)).await?;
        if !uploads.is_empty() {
            tracing::info!(
                sync_log_id = %sync_log_id,
                device_id = %device_id,
                leftovers = uploads.len(),
                "reconciling events left pending by an earlier session"
            );
        }
        if !queue.is_empty() {
            uploads.extend(self.ingestion.ingest(queue).await?);
        }
        counts.uploaded = uploads.len() as u32;
        let batch_ids: Vec<EventId> = uploads.iter().map(|e| *e.id()).collect();

        let mut accepted = Vec::with_capacity(uploads.len());
        let mut conflicts = Vec::new();
        for event in uploads {
            let (event, conflict) = self.reconcile(sync_log_id, event, &batch_ids).await?;
            if let Some(conflict) = conflict {
                counts.conflicts += 1;
                conflicts.push(conflict);
            }
            accepted.push(event);
        }

        let (downloads, has_more) = self.download_page(device_id, cursor).await?;
        counts.downloaded = downloads.len() as u32;

        Ok(Exchange {
            accepted,
            conflicts,
            downloads,
            has_more,
        })
    }

    /// One page of downloads after `cursor`, plus whether another page follows.
    async fn download_page(
        &self,
        device_id: &DeviceId,
        cursor: Option<SequenceNumber>,
    ) -> Result<(Vec<AnimalEvent>, bool), SyncError> {
        let limit = self.max_batch_size as u32;
        let mut downloads = self
            .reader
            .find_synced_after(cursor, device_id, limit.saturating_add(1))
            .await?;
        let has_more = downloads.len() > self.max_batch_size;
        downloads.truncate(self.max_batch_size);
        Ok((downloads, has_more))
    }

    /// Stamps the session device and skips entries a previous session already stored.
    async fn drop_already_stored(
        &self,
        device_id: &DeviceId,
        queue: Vec<QueuedEvent>,
    ) -> Result<Vec<QueuedEvent>, SyncError> {
        let offline_ids: Vec<_> = queue.iter().filter_map(|q| q.event.offline_id.clone()).collect();
        let stored = if offline_ids.is_empty() {
            Vec::new()
        } else {
            self.repository.existing_offline_ids(&offline_ids).await?
        };

        Ok(queue
            .into_iter()
            .filter(|q| match &q.event.offline_id {
                Some(id) if stored.contains(id) => {
                    tracing::debug!(offline_id = %id, "queued event already stored, skipped");
                    false
                }
                _ => true,
            })
            .map(|mut q| {
                q.event.device_id = Some(device_id.clone());
                q
            })
            .collect())
    }

    async fn reconcile(
        &self,
        sync_log_id: SyncLogId,
        mut event: AnimalEvent,
        batch_ids: &[EventId],
    ) -> Result<(AnimalEvent, Option<ConflictResolution>), SyncError> {
        let counterparts = self
            .reader
            .find_same_fact(event.animal_id(), event.event_type(), event.event_date(), batch_ids)
            .await?;
        let now = Timestamp::now();

        let Some(server) = counterparts
            .iter()
            .find(|c| diverges(c.as_record(), event.as_record()))
        else {
            event.mark_synced(now).map_err(EventError::from)?;
            return Ok((self.repository.update_sync_status(&event).await?, None));
        };

        let conflict = match self.recorded_conflict(&event).await? {
            Some(recorded) => recorded,
            None => {
                let mut conflict = ConflictResolution::open(
                    sync_log_id,
                    *event.id().as_uuid(),
                    snapshot(server.as_record()),
                    snapshot(event.as_record()),
                    self.policy.strategy(),
                );
                if conflict.strategy().is_automatic() {
                    conflict.auto_resolve(now)?;
                }
                self.conflicts.save(&conflict).await?;
                conflict
            }
        };

        event.flag_conflict(now).map_err(EventError::from)?;
        let flagged = self.repository.update_sync_status(&event).await?;
        tracing::warn!(
            event_id = %flagged.id(),
            server_event_id = %server.id(),
            conflict_id = %conflict.id(),
            strategy = %conflict.strategy(),
            "divergent event flagged as conflict"
        );

        if !conflict.is_resolved() {
            return Ok((flagged, Some(conflict)));
        }

        let mut settled = flagged;
        settled
            .retire_conflict(&conflict, now)
            .map_err(EventError::from)?;
        let settled = self.repository.update_sync_status(&settled).await?;
        Ok((settled, Some(conflict)))
    }

    /// Record an interrupted session wrote for a still-pending event.
    async fn recorded_conflict(
        &self,
        event: &AnimalEvent,
    ) -> Result<Option<ConflictResolution>, SyncError> {
        let mut recorded = self.conflicts.find_by_entity(event.id().as_uuid()).await?;
        Ok(recorded.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryConflictRepository, InMemoryEventLedger, InMemoryEventTypeRegistry,
        InMemorySyncLogRepository,
    };
    use crate::domain::event::{
        EventDetail, EventInput, EventKind, SyncStatus, Weight, WeighingDetail, WeighingType,
    };
    use crate::domain::foundation::{AnimalId, OfflineId};
    use crate::domain::sync::{ResolutionStrategy, SyncRunStatus};

    struct Fixture {
        ledger: Arc<InMemoryEventLedger>,
        sync_logs: Arc<InMemorySyncLogRepository>,
        conflicts: Arc<InMemoryConflictRepository>,
        handler: RunSyncSessionHandler,
    }

    fn fixture(policy: ConflictPolicy) -> Fixture {
        fixture_with_batch(policy, 100)
    }

    fn fixture_with_batch(policy: ConflictPolicy, max_batch_size: usize) -> Fixture {
        let ledger = Arc::new(InMemoryEventLedger::new());
        let sync_logs = Arc::new(InMemorySyncLogRepository::new());
        let conflicts = Arc::new(InMemoryConflictRepository::new());
        let handler = RunSyncSessionHandler::new(
            ledger.clone(),
            ledger.clone(),
            Arc::new(InMemoryEventTypeRegistry::with_defaults()),
            sync_logs.clone(),
            conflicts.clone(),
            policy,
            max_batch_size,
        );
        Fixture {
            ledger,
            sync_logs,
            conflicts,
            handler,
        }
    }

    fn device(id: &str) -> DeviceId {
        DeviceId::new(id).unwrap()
    }

    fn weighing(animal: AnimalId, date: Timestamp, kg: f64, offline: &str) -> QueuedEvent {
        let detail: EventDetail =
            WeighingDetail::new(Weight::from_kg(kg).unwrap(), WeighingType::Routine).into();
        QueuedEvent {
            event: EventInput::for_kind(
                EventKind::Weighing,
                animal,
                UserId::new("field-user").unwrap(),
                date,
            )
            .with_offline_id(OfflineId::new(offline).unwrap()),
            detail: Some(detail),
        }
    }

    /// Stores a queued event as `pending`, the way an interrupted session leaves it.
    async fn strand(ledger: &InMemoryEventLedger, device_id: &str, queued: &QueuedEvent) -> AnimalEvent {
        let mut input = queued.event.clone();
        input.device_id = Some(device(device_id));
        let mut event = AnimalEvent::record(input, Timestamp::now()).unwrap();
        if let Some(detail) = queued.detail.clone() {
            event = event.with_detail(detail).unwrap();
        }
        ledger.insert(&event).await.unwrap();
        event
    }

    fn session(device_id: &str, events: Vec<QueuedEvent>) -> RunSyncSessionCommand {
        RunSyncSessionCommand {
            device_id: device(device_id),
            user_id: UserId::new("field-user").unwrap(),
            events,
        }
    }

    #[tokio::test]
    async fn clean_upload_is_synced_with_sequence_numbers() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let date = Timestamp::now().minus_days(1);
        let outcome = fx
            .handler
            .handle(session(
                "tablet-1",
                vec![
                    weighing(AnimalId::new(), date, 410.0, "t1:1"),
                    weighing(AnimalId::new(), date, 380.0, "t1:2"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(outcome.log.status, SyncRunStatus::Completed);
        assert_eq!(outcome.log.counts.uploaded, 2);
        assert!(outcome
            .accepted
            .iter()
            .all(|e| e.sync_status() == SyncStatus::Synced && e.sequence_number().is_some()));
        assert!(outcome
            .accepted
            .iter()
            .all(|e| e.device_id() == Some(&device("tablet-1"))));
    }

    #[tokio::test]
    async fn divergent_fact_opens_admin_conflict() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let animal = AnimalId::new();
        let date = Timestamp::now().minus_days(2);
        fx.handler
            .handle(session("tablet-1", vec![weighing(animal, date, 410.0, "t1:1")]))
            .await
            .unwrap();

        let outcome = fx
            .handler
            .handle(session("tablet-2", vec![weighing(animal, date, 415.0, "t2:1")]))
            .await
            .unwrap();

        assert_eq!(outcome.log.status, SyncRunStatus::Partial);
        assert_eq!(outcome.accepted[0].sync_status(), SyncStatus::Conflict);
        assert!(outcome.accepted[0].sequence_number().is_none());
        let conflict = &outcome.conflicts[0];
        assert_eq!(conflict.strategy(), ResolutionStrategy::AdminDecides);
        assert!(!conflict.is_resolved());
        assert_eq!(conflict.server_version()["detail"]["weight"], 410.0);
        assert_eq!(conflict.client_version()["detail"]["weight"], 415.0);
        assert_eq!(fx.conflicts.len().await, 1);
    }

    #[tokio::test]
    async fn identical_fact_from_another_device_is_synced() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let animal = AnimalId::new();
        let date = Timestamp::now().minus_days(2);
        fx.handler
            .handle(session("tablet-1", vec![weighing(animal, date, 410.0, "t1:1")]))
            .await
            .unwrap();
        let outcome = fx
            .handler
            .handle(session("tablet-2", vec![weighing(animal, date, 410.0, "t2:1")]))
            .await
            .unwrap();
        assert_eq!(outcome.log.status, SyncRunStatus::Completed);
        assert!(outcome.conflicts.is_empty());
    }

    #[tokio::test]
    async fn automatic_policy_settles_conflict_immediately() {
        let fx = fixture(ConflictPolicy::ServerWins);
        let animal = AnimalId::new();
        let date = Timestamp::now().minus_days(2);
        fx.handler
            .handle(session("tablet-1", vec![weighing(animal, date, 410.0, "t1:1")]))
            .await
            .unwrap();
        let outcome = fx
            .handler
            .handle(session("tablet-2", vec![weighing(animal, date, 415.0, "t2:1")]))
            .await
            .unwrap();

        let conflict = &outcome.conflicts[0];
        assert!(conflict.is_resolved());
        assert!(conflict.resolved_by().is_none());
        assert_eq!(outcome.accepted[0].sync_status(), SyncStatus::Synced);
        assert!(outcome.accepted[0].sequence_number().is_some());
        assert_eq!(outcome.log.status, SyncRunStatus::Partial);
    }

    #[tokio::test]
    async fn downloads_come_from_other_devices_only() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let date = Timestamp::now().minus_days(1);
        fx.handler
            .handle(session("tablet-1", vec![weighing(AnimalId::new(), date, 410.0, "t1:1")]))
            .await
            .unwrap();

        let own = fx.handler.handle(session("tablet-1", vec![])).await.unwrap();
        assert!(own.downloads.is_empty());

        let other = fx.handler.handle(session("tablet-2", vec![])).await.unwrap();
        assert_eq!(other.downloads.len(), 1);
        assert_eq!(other.log.counts.downloaded, 1);
        assert_eq!(other.log.counts.uploaded, 0);
    }

    #[tokio::test]
    async fn retried_upload_skips_stored_entries() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let date = Timestamp::now().minus_days(1);
        let first = weighing(AnimalId::new(), date, 410.0, "t1:1");
        fx.handler
            .handle(session("tablet-1", vec![first.clone()]))
            .await
            .unwrap();

        let outcome = fx
            .handler
            .handle(session(
                "tablet-1",
                vec![first, weighing(AnimalId::new(), date, 300.0, "t1:2")],
            ))
            .await
            .unwrap();
        assert_eq!(outcome.log.counts.uploaded, 1);
        assert_eq!(fx.ledger.len().await, 2);
    }

    #[tokio::test]
    async fn store_failure_finalizes_log_as_error() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        fx.ledger.set_fail_writes(true);
        let result = fx
            .handler
            .handle(session(
                "tablet-1",
                vec![weighing(AnimalId::new(), Timestamp::now().minus_days(1), 410.0, "t1:1")],
            ))
            .await;
        assert!(matches!(
            result,
            Err(SyncError::Event(EventError::Infrastructure(_)))
        ));

        let logs = fx.sync_logs.all().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, SyncRunStatus::Error);
        assert!(logs[0].error_message.is_some());
    }

    #[tokio::test]
    async fn downloads_resume_after_the_cursor() {
        let fx = fixture_with_batch(ConflictPolicy::AdminDecides, 2);
        let date = Timestamp::now().minus_days(1);
        for batch in [["t1:1", "t1:2"], ["t1:3", "t1:4"]] {
            let queue = batch
                .iter()
                .map(|offline| weighing(AnimalId::new(), date, 400.0, offline))
                .collect();
            fx.handler.handle(session("tablet-1", queue)).await.unwrap();
        }

        let first = fx.handler.handle(session("tablet-2", vec![])).await.unwrap();
        assert_eq!(first.downloads.len(), 2);
        assert!(first.has_more);
        assert_eq!(
            first.log.download_cursor,
            first.downloads[1].sequence_number()
        );

        let second = fx.handler.handle(session("tablet-2", vec![])).await.unwrap();
        assert_eq!(second.downloads.len(), 2);
        assert!(!second.has_more);
        assert!(second.downloads[0].sequence_number() > first.downloads[1].sequence_number());

        let caught_up = fx.handler.handle(session("tablet-2", vec![])).await.unwrap();
        assert!(caught_up.downloads.is_empty());
        assert_eq!(caught_up.log.download_cursor, second.log.download_cursor);
    }

    #[tokio::test]
    async fn events_left_pending_by_an_interrupted_session_are_synced() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let date = Timestamp::now().minus_days(1);
        let first = weighing(AnimalId::new(), date, 410.0, "t1:1");
        let second = weighing(AnimalId::new(), date, 380.0, "t1:2");
        let stranded = strand(&fx.ledger, "tablet-1", &first).await;

        let outcome = fx
            .handler
            .handle(session("tablet-1", vec![first, second]))
            .await
            .unwrap();

        assert_eq!(outcome.log.counts.uploaded, 2);
        assert_eq!(outcome.accepted[0].id(), stranded.id());
        assert!(outcome
            .accepted
            .iter()
            .all(|e| e.sync_status() == SyncStatus::Synced && e.sequence_number().is_some()));
        assert!(fx.ledger.find_pending_sync(None).await.unwrap().is_empty());
        assert_eq!(fx.ledger.len().await, 2);
    }

    #[tokio::test]
    async fn conflict_record_is_kept_when_flagging_fails() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let animal = AnimalId::new();
        let date = Timestamp::now().minus_days(2);
        fx.handler
            .handle(session("tablet-1", vec![weighing(animal, date, 410.0, "t1:1")]))
            .await
            .unwrap();
        let queued = weighing(animal, date, 415.0, "t2:1");
        let stranded = strand(&fx.ledger, "tablet-2", &queued).await;

        fx.ledger.set_fail_writes(true);
        assert!(fx
            .handler
            .handle(session("tablet-2", vec![queued.clone()]))
            .await
            .is_err());
        assert_eq!(fx.conflicts.len().await, 1);
        let pending = fx.ledger.find_by_id(stranded.id()).await.unwrap().unwrap();
        assert_eq!(pending.sync_status(), SyncStatus::Pending);

        fx.ledger.set_fail_writes(false);
        let outcome = fx
            .handler
            .handle(session("tablet-2", vec![queued]))
            .await
            .unwrap();
        assert_eq!(outcome.accepted[0].sync_status(), SyncStatus::Conflict);
        assert_eq!(outcome.conflicts[0].entity_id(), stranded.id().as_uuid());
        assert_eq!(outcome.log.status, SyncRunStatus::Partial);
        assert_eq!(fx.conflicts.len().await, 1);
    }

    #[tokio::test]
    async fn queued_weighings_get_gain_through_a_session() {
        let fx = fixture(ConflictPolicy::AdminDecides);
        let animal = AnimalId::new();
        let t0 = Timestamp::now().minus_days(20);
        let outcome = fx
            .handler
            .handle(session(
                "tablet-1",
                vec![
                    weighing(animal, t0.add_days(10), 415.0, "t1:2"),
                    weighing(animal, t0, 400.0, "t1:1"),
                ],
            ))
            .await
            .unwrap();

        let later = outcome.accepted[0]
            .detail()
            .and_then(|d| d.as_weighing())
            .unwrap();
        assert_eq!(later.previous_weighing_id, Some(*outcome.accepted[1].id()));
        assert_eq!(later.average_daily_gain.map(|a| a.kg_per_day()), Some(1.5));
    }
}
