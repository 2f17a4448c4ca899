//! In-memory event ledger.
//!
//! Implements both the write and read ports over one shared state, with the
//! same uniqueness and sequencing guarantees as the PostgreSQL adapter.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::event::{AnimalEvent, EventDetail, EventTypeCode, SyncStatus};
use crate::domain::foundation::{
    AnimalId, DeviceId, DomainError, ErrorCode, EventId, FarmId, OfflineId, SequenceNumber,
    StateMachine, Timestamp,
};
use crate::ports::{
    EventFilter, EventReader, EventRepository, Page, PageRequest, ReproductionProjection,
    WeighingProjection,
};

#[derive(Debug, Default)]
struct LedgerState {
    /// Insertion order.
    events: Vec<AnimalEvent>,
    by_id: HashMap<EventId, usize>,
    offline_ids: HashMap<OfflineId, EventId>,
    last_sequence: i64,
}

impl LedgerState {
    fn duplicate_of<'a>(&self, events: &'a [AnimalEvent]) -> Option<&'a OfflineId> {
        let mut seen = HashSet::new();
        events
            .iter()
            .filter_map(|e| e.offline_id())
            .find(|id| self.offline_ids.contains_key(*id) || !seen.insert(*id))
    }

    fn push(&mut self, event: AnimalEvent) {
        if let Some(offline_id) = event.offline_id() {
            self.offline_ids.insert(offline_id.clone(), *event.id());
        }
        self.by_id.insert(*event.id(), self.events.len());
        self.events.push(event);
    }

    fn get(&self, id: &EventId) -> Option<&AnimalEvent> {
        self.by_id.get(id).map(|&i| &self.events[i])
    }
}

/// In-memory ledger store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLedger {
    state: Arc<RwLock<LedgerState>>,
    fail_writes: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

fn duplicate(offline_id: &OfflineId) -> DomainError {
    DomainError::new(
        ErrorCode::DuplicateOfflineId,
        "Event with this offlineId already exists",
    )
    .with_detail("offline_id", offline_id.as_str())
}

fn newest_first(events: &mut [AnimalEvent]) {
    events.sort_by(|a, b| b.event_date().cmp(a.event_date()));
}

fn paged(mut events: Vec<AnimalEvent>, page: &PageRequest) -> Page<AnimalEvent> {
    newest_first(&mut events);
    let total = events.len() as u64;
    let items = events
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Page::new(items, total, page)
}

impl InMemoryEventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `DatabaseError`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of port calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Every stored event in insertion order.
    pub async fn all(&self) -> Vec<AnimalEvent> {
        self.state.read().await.events.clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated write failure",
            ));
        }
        Ok(())
    }

    async fn select(&self, predicate: impl Fn(&AnimalEvent) -> bool) -> Vec<AnimalEvent> {
        self.touch();
        self.state
            .read()
            .await
            .events
            .iter()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    async fn latest_before<T>(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
        project: impl Fn(&AnimalEvent, &EventDetail) -> Option<T>,
    ) -> Option<T> {
        self.touch();
        let state = self.state.read().await;
        state
            .events
            .iter()
            .filter(|e| e.animal_id() == animal_id && e.event_date().is_before(before))
            .filter_map(|e| e.detail().and_then(|d| project(e, d)).map(|p| (*e.event_date(), p)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, p)| p)
    }
}

#[async_trait]
impl EventRepository for InMemoryEventLedger {
    async fn insert(&self, event: &AnimalEvent) -> Result<(), DomainError> {
        self.insert_batch(std::slice::from_ref(event)).await
    }

    async fn insert_batch(&self, events: &[AnimalEvent]) -> Result<(), DomainError> {
        self.touch();
        self.check_writable()?;
        let mut state = self.state.write().await;
        if let Some(offline_id) = state.duplicate_of(events) {
            return Err(duplicate(offline_id));
        }
        for event in events {
            state.push(event.clone());
        }
        Ok(())
    }

    async fn update_sync_status(&self, event: &AnimalEvent) -> Result<AnimalEvent, DomainError> {
        self.touch();
        self.check_writable()?;
        let mut state = self.state.write().await;
        let index = *state.by_id.get(event.id()).ok_or_else(|| {
            DomainError::new(ErrorCode::EventNotFound, format!("Event not found: {}", event.id()))
        })?;

        let stored = &state.events[index];
        let (from, to) = (stored.sync_status(), event.sync_status());
        let allowed = from.can_transition_to(&to)
            || (from == SyncStatus::Conflict && to == SyncStatus::Synced);
        if !allowed {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot change sync status from {} to {}", from, to),
            ));
        }

        let mut record = stored.clone().into_record();
        record.sync_status = to;
        record.sync_date = event.sync_date().copied();
        let mut updated = AnimalEvent::reconstitute(record);
        if to == SyncStatus::Synced && updated.sequence_number().is_none() {
            let next = SequenceNumber::new(state.last_sequence + 1)?;
            updated.assign_sequence(next)?;
            state.last_sequence = next.value();
        }

        state.events[index] = updated.clone();
        Ok(updated)
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<AnimalEvent>, DomainError> {
        self.touch();
        Ok(self.state.read().await.get(id).cloned())
    }

    async fn find_by_offline_id(
        &self,
        offline_id: &OfflineId,
    ) -> Result<Option<AnimalEvent>, DomainError> {
        self.touch();
        let state = self.state.read().await;
        Ok(state
            .offline_ids
            .get(offline_id)
            .and_then(|id| state.get(id))
            .cloned())
    }

    async fn existing_offline_ids(
        &self,
        offline_ids: &[OfflineId],
    ) -> Result<Vec<OfflineId>, DomainError> {
        self.touch();
        let state = self.state.read().await;
        Ok(offline_ids
            .iter()
            .filter(|id| state.offline_ids.contains_key(*id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventReader for InMemoryEventLedger {
    async fn find_by_animal(
        &self,
        animal_id: &AnimalId,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError> {
        let events = self.select(|e| e.animal_id() == animal_id).await;
        Ok(paged(events, page))
    }

    async fn find_by_animal_and_type(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut events = self
            .select(|e| e.animal_id() == animal_id && e.event_type() == event_type)
            .await;
        events.sort_by(|a, b| a.event_date().cmp(b.event_date()));
        Ok(events)
    }

    async fn find_by_farm(
        &self,
        farm_id: &FarmId,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError> {
        let events = self
            .select(|e| e.farm_id() == Some(farm_id) && filter.matches(e))
            .await;
        Ok(paged(events, page))
    }

    async fn find_pending_sync(
        &self,
        device_id: Option<&DeviceId>,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut events = self
            .select(|e| {
                e.sync_status() == SyncStatus::Pending
                    && device_id.map_or(true, |d| e.device_id() == Some(d))
            })
            .await;
        events.sort_by(|a, b| a.local_registration_date().cmp(b.local_registration_date()));
        Ok(events)
    }

    async fn last_weighing(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<WeighingProjection>, DomainError> {
        Ok(self
            .latest_before(animal_id, before, |e, d| {
                d.as_weighing().map(|w| WeighingProjection {
                    event_id: *e.id(),
                    event_date: *e.event_date(),
                    weight: w.weight,
                })
            })
            .await)
    }

    async fn last_reproduction(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<ReproductionProjection>, DomainError> {
        Ok(self
            .latest_before(animal_id, before, |e, d| {
                d.as_reproduction().map(|r| ReproductionProjection {
                    event_id: *e.id(),
                    event_date: *e.event_date(),
                    service_type: r.service_type,
                    result: r.result,
                    attempt_number: r.attempt_number,
                    estimated_birth_date: r.estimated_birth_date,
                })
            })
            .await)
    }

    async fn find_same_fact(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
        event_date: &Timestamp,
        excluding: &[EventId],
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        Ok(self
            .select(|e| {
                e.animal_id() == animal_id
                    && e.event_type() == event_type
                    && e.event_date() == event_date
                    && !excluding.contains(e.id())
            })
            .await)
    }

    async fn find_synced_after(
        &self,
        after: Option<SequenceNumber>,
        excluding_device: &DeviceId,
        limit: u32,
    ) -> Result<Vec<AnimalEvent>, DomainError> {
        let mut events = self
            .select(|e| {
                e.sync_status() == SyncStatus::Synced
                    && e.device_id() != Some(excluding_device)
                    && e.sequence_number() > after
            })
            .await;
        events.sort_by_key(|e| e.sequence_number());
        events.truncate(limit as usize);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{EventInput, EventKind, Weight, WeighingDetail, WeighingType};
    use crate::domain::foundation::UserId;

    fn event(animal: AnimalId, days_ago: i64, offline: Option<&str>) -> AnimalEvent {
        let mut input = EventInput::for_kind(
            EventKind::Weighing,
            animal,
            UserId::new("u-1").unwrap(),
            Timestamp::now().minus_days(days_ago),
        );
        if let Some(id) = offline {
            input = input.with_offline_id(OfflineId::new(id).unwrap());
        }
        AnimalEvent::record(input, Timestamp::now())
            .unwrap()
            .with_detail(
                WeighingDetail::new(Weight::from_kg(300.0 + days_ago as f64).unwrap(), WeighingType::Routine)
                    .into(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn unique_offline_id_is_enforced() {
        let ledger = InMemoryEventLedger::new();
        ledger.insert(&event(AnimalId::new(), 1, Some("dev:1"))).await.unwrap();
        let err = ledger
            .insert(&event(AnimalId::new(), 1, Some("dev:1")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateOfflineId);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn batch_with_one_duplicate_writes_nothing() {
        let ledger = InMemoryEventLedger::new();
        ledger.insert(&event(AnimalId::new(), 1, Some("dev:1"))).await.unwrap();
        let batch = vec![event(AnimalId::new(), 2, Some("dev:2")), event(AnimalId::new(), 3, Some("dev:1"))];
        assert!(ledger.insert_batch(&batch).await.is_err());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn sequence_is_assigned_on_sync_and_increases() {
        let ledger = InMemoryEventLedger::new();
        let mut a = event(AnimalId::new(), 1, None);
        let mut b = event(AnimalId::new(), 2, None);
        ledger.insert_batch(&[a.clone(), b.clone()]).await.unwrap();

        a.mark_synced(Timestamp::now()).unwrap();
        b.mark_synced(Timestamp::now()).unwrap();
        let a = ledger.update_sync_status(&a).await.unwrap();
        let b = ledger.update_sync_status(&b).await.unwrap();
        assert_eq!(a.sequence_number().map(|s| s.value()), Some(1));
        assert_eq!(b.sequence_number().map(|s| s.value()), Some(2));
    }

    #[tokio::test]
    async fn stored_status_cannot_move_backwards() {
        let ledger = InMemoryEventLedger::new();
        let mut e = event(AnimalId::new(), 1, None);
        ledger.insert(&e).await.unwrap();
        e.mark_synced(Timestamp::now()).unwrap();
        ledger.update_sync_status(&e).await.unwrap();

        let stale = event(AnimalId::new(), 1, None);
        let mut record = stale.into_record();
        record.id = *e.id();
        record.sync_status = SyncStatus::Conflict;
        let err = ledger
            .update_sync_status(&AnimalEvent::reconstitute(record))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn last_weighing_follows_business_time_not_arrival() {
        let ledger = InMemoryEventLedger::new();
        let animal = AnimalId::new();
        let older = event(animal, 20, None);
        let newer = event(animal, 5, None);
        ledger.insert(&newer).await.unwrap();
        ledger.insert(&older).await.unwrap();

        let before = Timestamp::now().minus_days(10);
        let projection = ledger.last_weighing(&animal, &before).await.unwrap().unwrap();
        assert_eq!(projection.event_id, *older.id());

        let latest = ledger
            .last_weighing(&animal, &Timestamp::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.event_id, *newer.id());
    }

    #[tokio::test]
    async fn animal_listing_is_paged_newest_first() {
        let ledger = InMemoryEventLedger::new();
        let animal = AnimalId::new();
        for days in [3, 1, 2] {
            ledger.insert(&event(animal, days, None)).await.unwrap();
        }
        let page = ledger
            .find_by_animal(&animal, &PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.has_more);
        assert!(page.items[0].event_date().is_after(page.items[1].event_date()));
    }

    #[tokio::test]
    async fn failing_writes_surface_database_error() {
        let ledger = InMemoryEventLedger::new();
        ledger.set_fail_writes(true);
        let err = ledger.insert(&event(AnimalId::new(), 1, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn synced_events_page_by_sequence_cursor() {
        let ledger = InMemoryEventLedger::new();
        let mut synced = Vec::new();
        for days in [4, 3, 2] {
            let mut e = event(AnimalId::new(), days, None);
            ledger.insert(&e).await.unwrap();
            e.mark_synced(Timestamp::now()).unwrap();
            synced.push(ledger.update_sync_status(&e).await.unwrap());
        }
        ledger.insert(&event(AnimalId::new(), 1, None)).await.unwrap();
        let device = DeviceId::new("tab-9").unwrap();

        let first = ledger.find_synced_after(None, &device, 2).await.unwrap();
        assert_eq!(first.len(), 2);
        let rest = ledger
            .find_synced_after(first[1].sequence_number(), &device, 2)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id(), synced[2].id());
    }
}
