//! AnimalEvent aggregate - the canonical ledger row.
//!
//! An event records one occurrence in an animal's history. Business content
//! is fixed at construction time; afterwards only the synchronization fields
//! (`sync_status`, `sync_date`, `sequence_number`) move, and only forward.
//! Events are never deleted: corrections are new events.

use serde::{Deserialize, Serialize};

use super::{
    EventCategory, EventDetail, EventKind, EventMetadata, EventTypeCode, GpsLocation, SyncStatus,
};
use crate::domain::foundation::{
    AnimalId, DeviceId, EventId, FarmId, LotId, OfflineId, PaddockId, SequenceNumber,
    StateMachine, Timestamp, UserId, ValidationError,
};
use crate::domain::sync::ConflictResolution;

/// Maximum length for free-text observations.
pub const MAX_OBSERVATIONS_LENGTH: usize = 2000;

/// Base-event-shaped input, as captured by a device or typed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    pub animal_id: AnimalId,
    pub user_id: UserId,
    /// Business time of the occurrence.
    pub event_date: Timestamp,
    /// Capture time on the device; defaults to the moment of registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_registration_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_date: Option<Timestamp>,
    pub event_type: EventTypeCode,
    pub category: EventCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_id: Option<FarmId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<LotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paddock_id: Option<PaddockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_location: Option<GpsLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline_id: Option<OfflineId>,
    #[serde(default = "default_manual")]
    pub is_manual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(default)]
    pub metadata: EventMetadata,
}

fn default_manual() -> bool {
    true
}

impl EventInput {
    /// Minimal input; optional context is added with the `with_*` builders.
    pub fn new(
        animal_id: AnimalId,
        user_id: UserId,
        event_date: Timestamp,
        event_type: EventTypeCode,
        category: EventCategory,
    ) -> Self {
        Self {
            animal_id,
            user_id,
            event_date,
            local_registration_date: None,
            sync_date: None,
            event_type,
            category,
            farm_id: None,
            lot_id: None,
            paddock_id: None,
            gps_location: None,
            device_id: None,
            offline_id: None,
            is_manual: true,
            observations: None,
            metadata: EventMetadata::new(),
        }
    }

    /// Input for one of the canonical kinds, using its code and default category.
    pub fn for_kind(
        kind: EventKind,
        animal_id: AnimalId,
        user_id: UserId,
        event_date: Timestamp,
    ) -> Self {
        // Canonical codes are static, upper-case and always valid.
        let code = EventTypeCode::new(kind.type_code())
            .unwrap_or_else(|_| unreachable!("canonical type code is valid"));
        Self::new(animal_id, user_id, event_date, code, kind.default_category())
    }

    pub fn with_farm(mut self, farm_id: FarmId) -> Self {
        self.farm_id = Some(farm_id);
        self
    }

    pub fn with_lot(mut self, lot_id: LotId) -> Self {
        self.lot_id = Some(lot_id);
        self
    }

    pub fn with_paddock(mut self, paddock_id: PaddockId) -> Self {
        self.paddock_id = Some(paddock_id);
        self
    }

    pub fn with_device(mut self, device_id: DeviceId) -> Self {
        self.device_id = Some(device_id);
        self.is_manual = false;
        self
    }

    pub fn with_offline_id(mut self, offline_id: OfflineId) -> Self {
        self.offline_id = Some(offline_id);
        self
    }

    pub fn with_local_registration_date(mut self, at: Timestamp) -> Self {
        self.local_registration_date = Some(at);
        self
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = Some(observations.into());
        self
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Full persisted shape of an event.
///
/// Used to reconstitute aggregates from storage and as the response
/// projection handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    pub sequence_number: Option<SequenceNumber>,
    pub animal_id: AnimalId,
    pub user_id: UserId,
    pub event_date: Timestamp,
    pub local_registration_date: Timestamp,
    pub sync_date: Option<Timestamp>,
    pub event_type: EventTypeCode,
    pub category: EventCategory,
    pub farm_id: Option<FarmId>,
    pub lot_id: Option<LotId>,
    pub paddock_id: Option<PaddockId>,
    pub gps_location: Option<GpsLocation>,
    pub device_id: Option<DeviceId>,
    pub offline_id: Option<OfflineId>,
    pub is_manual: bool,
    pub observations: Option<String>,
    pub metadata: EventMetadata,
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<EventDetail>,
}

/// Ledger event aggregate.
///
/// # Invariants
///
/// - `event_date <= now` at construction
/// - `local_registration_date >= event_date`
/// - `sync_date >= local_registration_date` when present
/// - `sequence_number` is present only once synced
/// - `detail`, when present, matches the event type and passed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct AnimalEvent(EventRecord);

impl TryFrom<EventRecord> for AnimalEvent {
    type Error = ValidationError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        AnimalEvent::restore(record)
    }
}

impl From<AnimalEvent> for EventRecord {
    fn from(event: AnimalEvent) -> Self {
        event.0
    }
}

impl AnimalEvent {
    /// Builds a new pending event from input, validating the temporal rules.
    ///
    /// `now` is the server's notion of the current moment.
    pub fn record(input: EventInput, now: Timestamp) -> Result<Self, ValidationError> {
        if input.event_date.is_after(&now) {
            return Err(ValidationError::invalid_format(
                "event_date",
                "must not be in the future",
            ));
        }

        let local_registration_date = input.local_registration_date.unwrap_or(now);
        if local_registration_date.is_before(&input.event_date) {
            return Err(ValidationError::invalid_format(
                "local_registration_date",
                "must not precede the event date",
            ));
        }

        if let Some(sync_date) = input.sync_date {
            if sync_date.is_before(&local_registration_date) {
                return Err(ValidationError::invalid_format(
                    "sync_date",
                    "must not precede the local registration date",
                ));
            }
        }

        let observations = match input.observations {
            Some(text) if text.trim().is_empty() => None,
            Some(text) if text.len() > MAX_OBSERVATIONS_LENGTH => {
                return Err(ValidationError::invalid_format(
                    "observations",
                    format!("must be at most {} characters", MAX_OBSERVATIONS_LENGTH),
                ));
            }
            other => other.map(|t| t.trim().to_string()),
        };

        Ok(Self(EventRecord {
            id: EventId::new(),
            sequence_number: None,
            animal_id: input.animal_id,
            user_id: input.user_id,
            event_date: input.event_date,
            local_registration_date,
            sync_date: input.sync_date,
            event_type: input.event_type,
            category: input.category,
            farm_id: input.farm_id,
            lot_id: input.lot_id,
            paddock_id: input.paddock_id,
            gps_location: input.gps_location,
            device_id: input.device_id,
            offline_id: input.offline_id,
            is_manual: input.is_manual,
            observations,
            metadata: input.metadata,
            sync_status: SyncStatus::Pending,
            detail: None,
        }))
    }

    /// Reconstitute an event from persistence (no validation).
    pub fn reconstitute(record: EventRecord) -> Self {
        Self(record)
    }

    /// Rebuilds an event from an untrusted record, re-checking every stored invariant.
    ///
    /// `event_date <= now` is not re-checked: it held when the event was recorded.
    pub fn restore(record: EventRecord) -> Result<Self, ValidationError> {
        if record.local_registration_date.is_before(&record.event_date) {
            return Err(ValidationError::invalid_format(
                "local_registration_date",
                "must not precede the event date",
            ));
        }
        if let Some(sync_date) = &record.sync_date {
            if sync_date.is_before(&record.local_registration_date) {
                return Err(ValidationError::invalid_format(
                    "sync_date",
                    "must not precede the local registration date",
                ));
            }
        }
        if record.sequence_number.is_some() && record.sync_status != SyncStatus::Synced {
            return Err(ValidationError::invalid_format(
                "sequence_number",
                "only synced events carry a sequence number",
            ));
        }

        let detail = record.detail.clone();
        let event = Self(EventRecord {
            detail: None,
            sequence_number: None,
            ..record.clone()
        });
        let event = match detail {
            Some(detail) => event.with_detail(detail)?,
            None => event,
        };
        Ok(Self(EventRecord {
            detail: event.0.detail,
            ..record
        }))
    }

    /// Attaches the variant detail before the event is first persisted.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if a detail is already attached, the event was
    ///   already synced, or the kind contradicts a canonical type code
    /// - any variant-specific validation error
    pub fn with_detail(mut self, detail: EventDetail) -> Result<Self, ValidationError> {
        if self.0.detail.is_some() || self.0.sequence_number.is_some() {
            return Err(ValidationError::invalid_format(
                "detail",
                "details can only be attached to a new event",
            ));
        }
        if let Some(kind) = EventKind::from_type_code(&self.0.event_type) {
            if kind != detail.kind() {
                return Err(ValidationError::invalid_format(
                    "detail",
                    format!(
                        "event type {} does not carry {} details",
                        self.0.event_type,
                        detail.kind()
                    ),
                ));
            }
        }
        detail.validate()?;
        self.0.detail = Some(detail);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &EventId {
        &self.0.id
    }

    pub fn sequence_number(&self) -> Option<SequenceNumber> {
        self.0.sequence_number
    }

    pub fn animal_id(&self) -> &AnimalId {
        &self.0.animal_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }

    pub fn event_date(&self) -> &Timestamp {
        &self.0.event_date
    }

    pub fn local_registration_date(&self) -> &Timestamp {
        &self.0.local_registration_date
    }

    pub fn sync_date(&self) -> Option<&Timestamp> {
        self.0.sync_date.as_ref()
    }

    pub fn event_type(&self) -> &EventTypeCode {
        &self.0.event_type
    }

    pub fn category(&self) -> EventCategory {
        self.0.category
    }

    pub fn farm_id(&self) -> Option<&FarmId> {
        self.0.farm_id.as_ref()
    }

    pub fn lot_id(&self) -> Option<&LotId> {
        self.0.lot_id.as_ref()
    }

    pub fn paddock_id(&self) -> Option<&PaddockId> {
        self.0.paddock_id.as_ref()
    }

    pub fn gps_location(&self) -> Option<&GpsLocation> {
        self.0.gps_location.as_ref()
    }

    pub fn device_id(&self) -> Option<&DeviceId> {
        self.0.device_id.as_ref()
    }

    pub fn offline_id(&self) -> Option<&OfflineId> {
        self.0.offline_id.as_ref()
    }

    pub fn is_manual(&self) -> bool {
        self.0.is_manual
    }

    pub fn observations(&self) -> Option<&str> {
        self.0.observations.as_deref()
    }

    pub fn metadata(&self) -> &EventMetadata {
        &self.0.metadata
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.0.sync_status
    }

    pub fn detail(&self) -> Option<&EventDetail> {
        self.0.detail.as_ref()
    }

    pub fn as_record(&self) -> &EventRecord {
        &self.0
    }

    pub fn into_record(self) -> EventRecord {
        self.0
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Synchronization
    // ─────────────────────────────────────────────────────────────────────────

    /// Moves a pending event to `Synced`.
    ///
    /// The sequence number is assigned separately by the store.
    pub fn mark_synced(&mut self, at: Timestamp) -> Result<(), ValidationError> {
        self.move_sync_status(SyncStatus::Synced, at)
    }

    /// Moves a pending event to `Conflict`.
    pub fn flag_conflict(&mut self, at: Timestamp) -> Result<(), ValidationError> {
        self.move_sync_status(SyncStatus::Conflict, at)
    }

    /// Retires a conflict once its resolution record has been resolved.
    pub fn retire_conflict(
        &mut self,
        resolution: &ConflictResolution,
        at: Timestamp,
    ) -> Result<(), ValidationError> {
        if self.0.sync_status != SyncStatus::Conflict {
            return Err(ValidationError::invalid_transition(
                self.0.sync_status,
                SyncStatus::Synced,
            ));
        }
        if resolution.entity_id() != self.0.id.as_uuid() {
            return Err(ValidationError::invalid_format(
                "conflict",
                "resolution record belongs to a different event",
            ));
        }
        if !resolution.is_resolved() {
            return Err(ValidationError::invalid_format(
                "conflict",
                "resolution record is still open",
            ));
        }
        self.stamp_sync_date(at)?;
        self.0.sync_status = SyncStatus::Synced;
        Ok(())
    }

    /// Records the store-assigned sequence number of a synced event.
    pub fn assign_sequence(&mut self, sequence: SequenceNumber) -> Result<(), ValidationError> {
        if self.0.sync_status != SyncStatus::Synced {
            return Err(ValidationError::invalid_format(
                "sequence_number",
                "only synced events carry a sequence number",
            ));
        }
        if self.0.sequence_number.is_some() {
            return Err(ValidationError::invalid_format(
                "sequence_number",
                "sequence number is already assigned",
            ));
        }
        self.0.sequence_number = Some(sequence);
        Ok(())
    }

    fn move_sync_status(&mut self, target: SyncStatus, at: Timestamp) -> Result<(), ValidationError> {
        let next = self.0.sync_status.transition_to(target)?;
        self.stamp_sync_date(at)?;
        self.0.sync_status = next;
        Ok(())
    }

    fn stamp_sync_date(&mut self, at: Timestamp) -> Result<(), ValidationError> {
        if at.is_before(&self.0.local_registration_date) {
            return Err(ValidationError::invalid_format(
                "sync_date",
                "must not precede the local registration date",
            ));
        }
        self.0.sync_date = Some(at);
        Ok(())
    }
}
