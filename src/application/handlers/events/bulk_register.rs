//! BulkRegisterEventsHandler - Batch ingestion of a device's offline queue.
//!
//! All-or-nothing: every check runs and every event is built in memory before
//! the single bulk insert. The public command seeds base events only; the sync
//! session ingests queued events together with their variant details.
//!
//! Queued weighing and reproduction details get the same derived fields as
//! the single-event handlers. Events are walked in business-time order so a
//! queued predecessor counts as history for the entries after it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::derivation::{
    estimate_birth_date, later, link_weighing, next_attempt, reproduction_projection,
    weighing_projection,
};
use super::registrar::attach_detail;
use super::EventRegistrar;
use crate::domain::event::{AnimalEvent, EventDetail, EventError, EventInput, EventTypeCode};
use crate::domain::foundation::{AnimalId, OfflineId, Timestamp};
use crate::domain::metrics::GestationCalculator;
use crate::ports::{
    EventReader, EventRepository, EventTypeDefinition, EventTypeRegistry, ReproductionProjection,
    WeighingProjection,
};

/// A recorded event awaiting its detail.
type Staged = (EventTypeDefinition, AnimalEvent, Option<EventDetail>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRegisterEventsCommand {
    pub events: Vec<EventInput>,
}

/// One entry of a device queue: base fields plus an optional variant detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<EventDetail>,
}

impl From<EventInput> for QueuedEvent {
    fn from(event: EventInput) -> Self {
        Self { event, detail: None }
    }
}

pub struct BulkRegisterEventsHandler {
    repository: Arc<dyn EventRepository>,
    reader: Arc<dyn EventReader>,
    registrar: EventRegistrar,
    gestation: GestationCalculator,
    max_batch_size: usize,
}

impl BulkRegisterEventsHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        reader: Arc<dyn EventReader>,
        registry: Arc<dyn EventTypeRegistry>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            registrar: EventRegistrar::new(repository.clone(), registry),
            repository,
            reader,
            gestation: GestationCalculator::cattle(),
            max_batch_size,
        }
    }

    pub fn with_gestation(mut self, gestation: GestationCalculator) -> Self {
        self.gestation = gestation;
        self
    }

    /// Returns the stored events in input order.
    pub async fn handle(&self, cmd: BulkRegisterEventsCommand) -> Result<Vec<AnimalEvent>, EventError> {
        self.ingest(cmd.events.into_iter().map(QueuedEvent::from).collect())
            .await
    }

    /// Same checks as `handle`, with details validated against each type definition.
    pub async fn ingest(&self, queue: Vec<QueuedEvent>) -> Result<Vec<AnimalEvent>, EventError> {
        if queue.is_empty() {
            return Err(EventError::EmptyBatch);
        }
        if queue.len() > self.max_batch_size {
            return Err(EventError::BatchTooLarge {
                max: self.max_batch_size,
                actual: queue.len(),
            });
        }

        let offline_ids = unique_offline_ids(queue.iter().map(|q| &q.event))?;
        if !offline_ids.is_empty() {
            let existing = self.repository.existing_offline_ids(&offline_ids).await?;
            if let Some(first) = existing.first() {
                tracing::debug!(offline_id = %first, "batch rejected, offline id already stored");
                return Err(EventError::DuplicateOfflineId(first.to_string()));
            }
        }

        let now = Timestamp::now();
        let mut definitions: HashMap<EventTypeCode, EventTypeDefinition> = HashMap::new();
        let mut staged: Vec<Staged> = Vec::with_capacity(queue.len());
        for QueuedEvent { event, detail } in queue {
            let definition = match definitions.get(&event.event_type) {
                Some(definition) => definition.clone(),
                None => {
                    let definition = self.registrar.resolve_type(&event.event_type).await?;
                    definitions.insert(event.event_type.clone(), definition.clone());
                    definition
                }
            };
            staged.push((definition, AnimalEvent::record(event, now)?, detail));
        }

        self.derive(&mut staged).await?;
        let events = staged
            .into_iter()
            .map(|(definition, event, detail)| attach_detail(&definition, event, detail))
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(err) = self.repository.insert_batch(&events).await {
            tracing::error!(count = events.len(), error = %err, "bulk insert failed");
            return Err(err.into());
        }

        tracing::info!(count = events.len(), "batch registered");
        Ok(events)
    }
}

impl BulkRegisterEventsHandler {
    /// Fills history-derived detail fields, oldest event first.
    async fn derive(&self, staged: &mut [Staged]) -> Result<(), EventError> {
        let mut order: Vec<usize> = (0..staged.len()).collect();
        order.sort_by_key(|&i| *staged[i].1.event_date());

        let mut weighings: HashMap<AnimalId, Vec<WeighingProjection>> = HashMap::new();
        let mut services: HashMap<AnimalId, Vec<ReproductionProjection>> = HashMap::new();
        for i in order {
            let (_, event, detail) = &mut staged[i];
            let animal_id = *event.animal_id();
            match detail {
                Some(EventDetail::Weighing(weighing)) => {
                    let stored = self
                        .reader
                        .last_weighing(&animal_id, event.event_date())
                        .await?;
                    let queued = queued_before(weighings.get(&animal_id), event.event_date(), |p| {
                        p.event_date
                    });
                    let previous = later(stored, queued, |p| p.event_date);
                    link_weighing(event, previous.as_ref(), weighing);
                    weighings
                        .entry(animal_id)
                        .or_default()
                        .push(weighing_projection(event, weighing));
                }
                Some(EventDetail::Reproduction(service)) => {
                    if service.attempt_number == 0 {
                        let stored = self
                            .reader
                            .last_reproduction(&animal_id, event.event_date())
                            .await?;
                        let queued = queued_before(services.get(&animal_id), event.event_date(), |p| {
                            p.event_date
                        });
                        let previous = later(stored, queued, |p| p.event_date);
                        service.attempt_number = next_attempt(previous.as_ref());
                    }
                    estimate_birth_date(&self.gestation, event, service)?;
                    services
                        .entry(animal_id)
                        .or_default()
                        .push(reproduction_projection(event, service));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Latest entry of an already-walked batch strictly before `before`.
fn queued_before<T: Clone>(
    seen: Option<&Vec<T>>,
    before: &Timestamp,
    date: impl Fn(&T) -> Timestamp,
) -> Option<T> {
    seen?.iter().rev().find(|p| date(p).is_before(before)).cloned()
}

/// Rejects in-batch duplicates; never touches the store.
fn unique_offline_ids<'a>(
    inputs: impl Iterator<Item = &'a EventInput>,
) -> Result<Vec<OfflineId>, EventError> {
    let mut seen = HashSet::new();
    for offline_id in inputs.filter_map(|i| i.offline_id.as_ref()) {
        if !seen.insert(offline_id) {
            return Err(EventError::DuplicateOfflineIdInBatch(offline_id.to_string()));
        }
    }
    Ok(seen.into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{EventKind, SyncStatus};
    use crate::domain::foundation::AnimalId;

    fn queued(offline: &str, days_ago: i64) -> EventInput {
        input(EventKind::Weighing, AnimalId::new(), days_ago)
            .with_offline_id(OfflineId::new(offline).unwrap())
    }

    fn handler(fx: &Fixture) -> BulkRegisterEventsHandler {
        BulkRegisterEventsHandler::new(
            fx.ledger.clone(),
            fx.ledger.clone(),
            fx.registry.clone(),
            500,
        )
    }

    #[tokio::test]
    async fn empty_batch_is_an_error() {
        let fx = fixture();
        let err = handler(&fx)
            .handle(BulkRegisterEventsCommand { events: vec![] })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No events provided");
    }

    #[tokio::test]
    async fn stores_pending_events_in_input_order() {
        let fx = fixture();
        let stored = handler(&fx)
            .handle(BulkRegisterEventsCommand {
                events: vec![queued("d:1", 3), queued("d:2", 2), queued("d:3", 1)],
            })
            .await
            .unwrap();
        let ids: Vec<_> = stored.iter().map(|e| e.offline_id().unwrap().as_str()).collect();
        assert_eq!(ids, vec!["d:1", "d:2", "d:3"]);
        assert!(stored.iter().all(|e| e.sync_status() == SyncStatus::Pending));
        assert!(stored.iter().all(|e| e.detail().is_none()));
        assert_eq!(fx.ledger.len().await, 3);
    }

    #[tokio::test]
    async fn in_batch_duplicate_is_rejected_before_store_access() {
        let fx = fixture();
        let err = handler(&fx)
            .handle(BulkRegisterEventsCommand {
                events: vec![queued("d:1", 2), queued("d:1", 1)],
            })
            .await
            .unwrap_err();
        assert_eq!(err, EventError::DuplicateOfflineIdInBatch("d:1".to_string()));
        assert_eq!(fx.ledger.call_count(), 0);
    }

    #[tokio::test]
    async fn one_stored_offline_id_rejects_the_whole_batch() {
        let fx = fixture();
        let h = handler(&fx);
        h.handle(BulkRegisterEventsCommand { events: vec![queued("d:2", 5)] })
            .await
            .unwrap();

        let err = h
            .handle(BulkRegisterEventsCommand {
                events: vec![queued("d:1", 3), queued("d:2", 2), queued("d:3", 1)],
            })
            .await
            .unwrap_err();
        assert_eq!(err, EventError::DuplicateOfflineId("d:2".to_string()));
        assert_eq!(fx.ledger.len().await, 1);
    }

    #[tokio::test]
    async fn invalid_record_aborts_before_insert() {
        let fx = fixture();
        let mut bad = queued("d:2", 0);
        bad.event_date = Timestamp::now().add_days(1);
        let result = handler(&fx)
            .handle(BulkRegisterEventsCommand {
                events: vec![queued("d:1", 1), bad],
            })
            .await;
        assert!(matches!(result, Err(EventError::ValidationFailed { .. })));
        assert!(fx.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let fx = fixture();
        let h = BulkRegisterEventsHandler::new(
            fx.ledger.clone(),
            fx.ledger.clone(),
            fx.registry.clone(),
            2,
        );
        let err = h
            .handle(BulkRegisterEventsCommand {
                events: vec![queued("a", 1), queued("b", 1), queued("c", 1)],
            })
            .await
            .unwrap_err();
        assert_eq!(err, EventError::BatchTooLarge { max: 2, actual: 3 });
    }

    #[tokio::test]
    async fn queued_details_are_stored_with_their_event() {
        use crate::domain::event::{Weight, WeighingDetail, WeighingType};

        let fx = fixture();
        let detail: EventDetail =
            WeighingDetail::new(Weight::from_kg(412.0).unwrap(), WeighingType::Routine).into();
        let stored = handler(&fx)
            .ingest(vec![QueuedEvent {
                event: queued("d:1", 1),
                detail: Some(detail.clone()),
            }])
            .await
            .unwrap();
        assert_eq!(stored[0].detail(), Some(&detail));
    }

    #[tokio::test]
    async fn queued_detail_of_another_kind_rejects_the_batch() {
        use crate::domain::event::{DeathCauseCategory, DeathDetail};

        let fx = fixture();
        let err = handler(&fx)
            .ingest(vec![
                queued("d:1", 2).into(),
                QueuedEvent {
                    event: queued("d:2", 1),
                    detail: Some(
                        DeathDetail {
                            cause: "Bloat".to_string(),
                            cause_category: DeathCauseCategory::Disease,
                            necropsy_performed: false,
                            notifiable: false,
                            loss_value: None,
                        }
                        .into(),
                    ),
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::DetailMismatch { .. }));
        assert!(fx.ledger.is_empty().await);
    }

    fn queued_weighing(animal: AnimalId, at: Timestamp, kg: f64, offline: &str) -> QueuedEvent {
        use crate::domain::event::{Weight, WeighingDetail, WeighingType};

        let mut event = input(EventKind::Weighing, animal, 0)
            .with_offline_id(OfflineId::new(offline).unwrap());
        event.event_date = at;
        let detail = WeighingDetail::new(Weight::from_kg(kg).unwrap(), WeighingType::Routine);
        QueuedEvent {
            event,
            detail: Some(detail.into()),
        }
    }

    fn weighing_of(event: &AnimalEvent) -> &crate::domain::event::WeighingDetail {
        event.detail().and_then(|d| d.as_weighing()).unwrap()
    }

    #[tokio::test]
    async fn queued_weighings_derive_gain_within_the_batch() {
        let fx = fixture();
        let animal = AnimalId::new();
        let t0 = Timestamp::now().minus_days(30);

        // Newer reading queued first.
        let stored = handler(&fx)
            .ingest(vec![
                queued_weighing(animal, t0.add_days(10), 415.0, "d:2"),
                queued_weighing(animal, t0, 400.0, "d:1"),
            ])
            .await
            .unwrap();

        let later_one = weighing_of(&stored[0]);
        assert_eq!(later_one.previous_weighing_id, Some(*stored[1].id()));
        assert_eq!(later_one.days_since_previous, Some(10));
        assert_eq!(later_one.average_daily_gain.map(|a| a.kg_per_day()), Some(1.5));
        assert!(weighing_of(&stored[1]).previous_weighing_id.is_none());
    }

    #[tokio::test]
    async fn queued_weighing_links_to_stored_history() {
        let fx = fixture();
        let h = handler(&fx);
        let animal = AnimalId::new();
        let t0 = Timestamp::now().minus_days(30);
        let first = h
            .ingest(vec![queued_weighing(animal, t0, 400.0, "d:1")])
            .await
            .unwrap();

        let second = h
            .ingest(vec![queued_weighing(animal, t0.add_days(10), 415.0, "d:2")])
            .await
            .unwrap();
        let detail = weighing_of(&second[0]);
        assert_eq!(detail.previous_weighing_id, Some(*first[0].id()));
        assert_eq!(detail.average_daily_gain.map(|a| a.kg_per_day()), Some(1.5));
    }

    #[tokio::test]
    async fn queued_service_gets_estimate_and_attempt() {
        use crate::domain::event::{ReproductionDetail, ReproductionResult, ServiceType};

        let fx = fixture();
        let animal = AnimalId::new();
        let service = |days_ago: i64, result: ReproductionResult, offline: &str| QueuedEvent {
            event: input(EventKind::Reproduction, animal, days_ago)
                .with_offline_id(OfflineId::new(offline).unwrap()),
            detail: Some(
                ReproductionDetail {
                    service_type: Some(ServiceType::NaturalMating),
                    stud_id: None,
                    result,
                    diagnosis_date: None,
                    diagnosis_method: None,
                    estimated_birth_date: None,
                    attempt_number: 0,
                }
                .into(),
            ),
        };

        let stored = handler(&fx)
            .ingest(vec![
                service(21, ReproductionResult::Empty, "d:1"),
                service(1, ReproductionResult::Pending, "d:2"),
            ])
            .await
            .unwrap();

        let first = stored[0].detail().and_then(|d| d.as_reproduction()).unwrap();
        let second = stored[1].detail().and_then(|d| d.as_reproduction()).unwrap();
        assert_eq!(first.attempt_number, 1);
        assert_eq!(second.attempt_number, 2);
        let expected = stored[1]
            .event_date()
            .date()
            .checked_add_days(chrono::Days::new(283));
        assert_eq!(second.estimated_birth_date, expected);
    }
}
