//! EventRegistrar - shared two-step registration protocol.
//!
//! `prepare` resolves the type code, runs the offline-id dedup check and
//! builds the base event in memory. `commit` attaches the variant detail and
//! writes event and detail in a single store call. Nothing is written until
//! the whole event, detail included, has passed validation.

use serde::{Serialize, Serializer};
use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventDetail, EventError, EventInput, EventRecord, EventTypeCode};
use crate::domain::foundation::Timestamp;
use crate::ports::{EventRepository, EventTypeDefinition, EventTypeRegistry};

/// Base event validated but not yet written.
#[derive(Debug, Clone)]
pub struct PreparedEvent {
    event: AnimalEvent,
    definition: EventTypeDefinition,
}

impl PreparedEvent {
    pub fn event(&self) -> &AnimalEvent {
        &self.event
    }

    pub fn definition(&self) -> &EventTypeDefinition {
        &self.definition
    }
}

/// Result of a variant registration: the stored event plus its typed detail.
///
/// Serializes as one flat projection of base and variant fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredEvent<D> {
    pub event: AnimalEvent,
    pub detail: D,
}

impl<D: Serialize> Serialize for RegisteredEvent<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a, D> {
            #[serde(flatten)]
            base: &'a EventRecord,
            #[serde(flatten)]
            detail: &'a D,
        }

        let mut base = self.event.as_record().clone();
        base.detail = None;
        Flat {
            base: &base,
            detail: &self.detail,
        }
        .serialize(serializer)
    }
}

/// Shared by every registration handler.
#[derive(Clone)]
pub struct EventRegistrar {
    repository: Arc<dyn EventRepository>,
    registry: Arc<dyn EventTypeRegistry>,
}

impl EventRegistrar {
    pub fn new(repository: Arc<dyn EventRepository>, registry: Arc<dyn EventTypeRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Resolves a code to an active definition.
    pub async fn resolve_type(&self, code: &EventTypeCode) -> Result<EventTypeDefinition, EventError> {
        let definition = self
            .registry
            .resolve(code)
            .await?
            .ok_or_else(|| EventError::UnknownEventType(code.to_string()))?;
        if !definition.active {
            return Err(EventError::InactiveEventType(code.to_string()));
        }
        Ok(definition)
    }

    /// Type resolution, dedup check and in-memory construction. No writes.
    pub async fn prepare(&self, input: EventInput) -> Result<PreparedEvent, EventError> {
        let definition = self.resolve_type(&input.event_type).await?;

        if let Some(offline_id) = &input.offline_id {
            if self.repository.find_by_offline_id(offline_id).await?.is_some() {
                tracing::debug!(offline_id = %offline_id, "duplicate offline id rejected");
                return Err(EventError::DuplicateOfflineId(offline_id.to_string()));
            }
        }

        let event = AnimalEvent::record(input, Timestamp::now())?;
        Ok(PreparedEvent { event, definition })
    }

    /// Attaches the detail, if any, and writes the event.
    pub async fn commit(
        &self,
        prepared: PreparedEvent,
        detail: Option<EventDetail>,
    ) -> Result<AnimalEvent, EventError> {
        let PreparedEvent { event, definition } = prepared;
        let event = attach_detail(&definition, event, detail)?;

        if let Err(err) = self.repository.insert(&event).await {
            tracing::error!(event_id = %event.id(), error = %err, "failed to store event");
            return Err(err.into());
        }

        tracing::info!(
            event_id = %event.id(),
            animal_id = %event.animal_id(),
            event_type = %event.event_type(),
            "event registered"
        );
        Ok(event)
    }

    /// `prepare` then `commit` for variants without derived fields.
    pub async fn register_with<D>(&self, input: EventInput, detail: D) -> Result<RegisteredEvent<D>, EventError>
    where
        D: Into<EventDetail> + Clone,
    {
        let prepared = self.prepare(input).await?;
        let event = self.commit(prepared, Some(detail.clone().into())).await?;
        Ok(RegisteredEvent { event, detail })
    }
}

/// Checks the detail kind against the type definition, then attaches it.
pub(crate) fn attach_detail(
    definition: &EventTypeDefinition,
    event: AnimalEvent,
    detail: Option<EventDetail>,
) -> Result<AnimalEvent, EventError> {
    let Some(detail) = detail else {
        return Ok(event);
    };
    if definition.kind != Some(detail.kind()) {
        return Err(EventError::DetailMismatch {
            event_type: definition.code.clone(),
            detail_kind: detail.kind(),
        });
    }
    Ok(event.with_detail(detail)?)
}
