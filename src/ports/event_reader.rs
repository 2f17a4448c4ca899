//! Event reader port (read side / CQRS queries).
//!
//! History queries and the projections derived metrics are computed from.
//!
//! # Design
//!
//! - **Business-time ordering**: projections are ordered by `event_date`,
//!   never by arrival, so late uploads find their true predecessor
//! - **Pagination**: animal and farm listings are paged; cross-event lookups are not

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::event::{
    AnimalEvent, EventCategory, EventTypeCode, ReproductionResult, ServiceType, SyncStatus, Weight,
};
use crate::domain::foundation::{
    AnimalId, DeviceId, DomainError, EventId, FarmId, SequenceNumber, Timestamp,
};
use async_trait::async_trait;

/// Reader port for ledger queries.
#[async_trait]
pub trait EventReader: Send + Sync {
    /// Events of one animal, newest `event_date` first.
    async fn find_by_animal(
        &self,
        animal_id: &AnimalId,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError>;

    /// Every event of one type for an animal, oldest first. Unpaginated.
    async fn find_by_animal_and_type(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
    ) -> Result<Vec<AnimalEvent>, DomainError>;

    /// Farm-wide listing, newest `event_date` first.
    async fn find_by_farm(
        &self,
        farm_id: &FarmId,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> Result<Page<AnimalEvent>, DomainError>;

    /// Every pending event, oldest local registration first.
    ///
    /// Restricted to one device when `device_id` is given.
    async fn find_pending_sync(
        &self,
        device_id: Option<&DeviceId>,
    ) -> Result<Vec<AnimalEvent>, DomainError>;

    /// Latest weighing strictly before `before`, by business time.
    async fn last_weighing(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<WeighingProjection>, DomainError>;

    /// Latest reproduction event strictly before `before`, by business time.
    async fn last_reproduction(
        &self,
        animal_id: &AnimalId,
        before: &Timestamp,
    ) -> Result<Option<ReproductionProjection>, DomainError>;

    /// Stored events that describe the same logical fact, other than `excluding`.
    async fn find_same_fact(
        &self,
        animal_id: &AnimalId,
        event_type: &EventTypeCode,
        event_date: &Timestamp,
        excluding: &[EventId],
    ) -> Result<Vec<AnimalEvent>, DomainError>;

    /// Synced events positioned after `after` that another device captured.
    ///
    /// Ordered by sequence number, at most `limit` rows. `None` starts from
    /// the beginning of the ledger.
    async fn find_synced_after(
        &self,
        after: Option<SequenceNumber>,
        excluding_device: &DeviceId,
        limit: u32,
    ) -> Result<Vec<AnimalEvent>, DomainError>;
}

/// Previous weighing as seen from a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighingProjection {
    pub event_id: EventId,
    pub event_date: Timestamp,
    pub weight: Weight,
}

/// Previous reproduction event as seen from a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproductionProjection {
    pub event_id: EventId,
    pub event_date: Timestamp,
    pub service_type: Option<ServiceType>,
    pub result: ReproductionResult,
    pub attempt_number: u32,
    pub estimated_birth_date: Option<NaiveDate>,
}

/// Optional narrowing for farm listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    pub event_type: Option<EventTypeCode>,
    pub category: Option<EventCategory>,
    pub sync_status: Option<SyncStatus>,
    /// Inclusive lower bound on `event_date`.
    pub from: Option<Timestamp>,
    /// Exclusive upper bound on `event_date`.
    pub until: Option<Timestamp>,
}

impl EventFilter {
    pub fn with_type(mut self, event_type: EventTypeCode) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_sync_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = Some(status);
        self
    }

    pub fn between(mut self, from: Timestamp, until: Timestamp) -> Self {
        self.from = Some(from);
        self.until = Some(until);
        self
    }

    /// In-memory evaluation of the filter.
    pub fn matches(&self, event: &AnimalEvent) -> bool {
        self.event_type.as_ref().map_or(true, |t| event.event_type() == t)
            && self.category.map_or(true, |c| event.category() == c)
            && self.sync_status.map_or(true, |s| event.sync_status() == s)
            && self.from.map_or(true, |f| !event.event_date().is_before(&f))
            && self.until.map_or(true, |u| event.event_date().is_before(&u))
    }
}

/// Maximum page size honoured by readers.
pub const MAX_PAGE_SIZE: u32 = 200;

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Clamps `page` to at least 1 and `per_page` to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        let seen = request.offset() + items.len() as u64;
        Self {
            items,
            total,
            page: request.page,
            per_page: request.per_page,
            has_more: seen < total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            has_more: self.has_more,
        }
    }
}
