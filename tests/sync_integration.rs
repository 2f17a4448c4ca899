//! Integration tests for offline synchronization.
//!
//! Two devices report the same weighing with different readings. The second
//! session raises a conflict, an administrator settles it, and the first
//! device picks the settled event up on its next session.

use std::sync::Arc;

use livestock_ledger::adapters::memory::{
    InMemoryConflictRepository, InMemoryEventLedger, InMemoryEventTypeRegistry,
    InMemorySyncLogRepository,
};
use livestock_ledger::application::{
    GetSyncLogHandler, GetSyncLogQuery, ListOpenConflictsHandler, ListOpenConflictsQuery,
    ListPendingSyncHandler, ListPendingSyncQuery, QueuedEvent, ResolveConflictCommand,
    ResolveConflictHandler, RunSyncSessionCommand, RunSyncSessionHandler,
};
use livestock_ledger::domain::event::{
    EventDetail, EventInput, EventKind, SyncStatus, Weight, WeighingDetail, WeighingType,
};
use livestock_ledger::domain::foundation::{AnimalId, DeviceId, OfflineId, Timestamp, UserId};
use livestock_ledger::domain::sync::{
    ConflictPolicy, ResolutionDecision, ResolutionStrategy, SyncRunStatus,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Server {
    ledger: Arc<InMemoryEventLedger>,
    sync_logs: Arc<InMemorySyncLogRepository>,
    conflicts: Arc<InMemoryConflictRepository>,
    sessions: RunSyncSessionHandler,
}

fn server() -> Server {
    let ledger = Arc::new(InMemoryEventLedger::new());
    let sync_logs = Arc::new(InMemorySyncLogRepository::new());
    let conflicts = Arc::new(InMemoryConflictRepository::new());
    let sessions = RunSyncSessionHandler::new(
        ledger.clone(),
        ledger.clone(),
        Arc::new(InMemoryEventTypeRegistry::with_defaults()),
        sync_logs.clone(),
        conflicts.clone(),
        ConflictPolicy::AdminDecides,
        500,
    );
    Server {
        ledger,
        sync_logs,
        conflicts,
        sessions,
    }
}

fn field_user() -> UserId {
    UserId::new("field-user").unwrap()
}

fn queued_weighing(animal: AnimalId, date: Timestamp, kg: f64, offline: &str) -> QueuedEvent {
    let detail: EventDetail =
        WeighingDetail::new(Weight::from_kg(kg).unwrap(), WeighingType::Routine).into();
    QueuedEvent {
        event: EventInput::for_kind(EventKind::Weighing, animal, field_user(), date)
            .with_offline_id(OfflineId::new(offline).unwrap()),
        detail: Some(detail),
    }
}

fn session(device: &str, events: Vec<QueuedEvent>) -> RunSyncSessionCommand {
    RunSyncSessionCommand {
        device_id: DeviceId::new(device).unwrap(),
        user_id: field_user(),
        events,
    }
}

// =============================================================================
// Conflict Lifecycle
// =============================================================================

#[tokio::test]
async fn divergent_upload_is_settled_and_reaches_the_other_device() {
    let server = server();
    let animal = AnimalId::new();
    let weighed_at = Timestamp::now().minus_days(3);

    let first = server
        .sessions
        .handle(session("tablet-a", vec![queued_weighing(animal, weighed_at, 410.0, "a:1")]))
        .await
        .unwrap();
    assert_eq!(first.log.status, SyncRunStatus::Completed);
    let server_copy = first.accepted[0].clone();
    assert_eq!(server_copy.sync_status(), SyncStatus::Synced);
    let server_sequence = server_copy.sequence_number().unwrap();

    let second = server
        .sessions
        .handle(session("tablet-b", vec![queued_weighing(animal, weighed_at, 415.0, "b:1")]))
        .await
        .unwrap();
    assert_eq!(second.log.status, SyncRunStatus::Partial);
    assert_eq!(second.log.counts.uploaded, 1);
    assert_eq!(second.log.counts.conflicts, 1);
    assert_eq!(second.downloads.len(), 1);
    assert_eq!(second.downloads[0].id(), server_copy.id());

    let flagged = second.accepted[0].clone();
    assert_eq!(flagged.sync_status(), SyncStatus::Conflict);
    assert!(flagged.sequence_number().is_none());

    let open = ListOpenConflictsHandler::new(server.conflicts.clone())
        .handle(ListOpenConflictsQuery::default())
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].strategy(), ResolutionStrategy::AdminDecides);
    assert_eq!(open[0].server_version()["detail"]["weight"], 410.0);
    assert_eq!(open[0].client_version()["detail"]["weight"], 415.0);

    let settlement = ResolveConflictHandler::new(server.conflicts.clone(), server.ledger.clone())
        .handle(ResolveConflictCommand {
            conflict_id: *open[0].id(),
            decision: ResolutionDecision::ClientWins,
            resolved_by: Some(UserId::new("herd-manager").unwrap()),
            notes: Some("scale on tablet-a was out of calibration".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(settlement.conflict.strategy(), ResolutionStrategy::ClientWins);
    assert_eq!(settlement.event.sync_status(), SyncStatus::Synced);
    assert!(settlement.event.sequence_number().unwrap() > server_sequence);

    let still_open = ListOpenConflictsHandler::new(server.conflicts.clone())
        .handle(ListOpenConflictsQuery::default())
        .await
        .unwrap();
    assert!(still_open.is_empty());

    let stored_log = GetSyncLogHandler::new(server.sync_logs.clone())
        .handle(GetSyncLogQuery {
            sync_log_id: second.log.id,
        })
        .await
        .unwrap();
    assert_eq!(stored_log.status, SyncRunStatus::Partial);
    assert!(stored_log.finished_at.is_some());

    let catch_up = server
        .sessions
        .handle(session("tablet-a", Vec::new()))
        .await
        .unwrap();
    assert_eq!(catch_up.log.status, SyncRunStatus::Completed);
    assert_eq!(catch_up.downloads.len(), 1);
    assert_eq!(catch_up.downloads[0].id(), flagged.id());
}

// =============================================================================
// Retries
// =============================================================================

#[tokio::test]
async fn retried_session_does_not_duplicate_uploaded_events() {
    let server = server();
    let animal = AnimalId::new();
    let queue = vec![
        queued_weighing(animal, Timestamp::now().minus_days(2), 300.0, "a:10"),
        queued_weighing(animal, Timestamp::now().minus_days(1), 302.0, "a:11"),
    ];

    let first = server
        .sessions
        .handle(session("tablet-a", queue.clone()))
        .await
        .unwrap();
    assert_eq!(first.log.counts.uploaded, 2);

    let retry = server
        .sessions
        .handle(session("tablet-a", queue))
        .await
        .unwrap();
    assert_eq!(retry.log.counts.uploaded, 0);
    assert_eq!(retry.log.status, SyncRunStatus::Completed);

    let pending = ListPendingSyncHandler::new(server.ledger.clone())
        .handle(ListPendingSyncQuery::default())
        .await
        .unwrap();
    assert!(pending.is_empty());
}
