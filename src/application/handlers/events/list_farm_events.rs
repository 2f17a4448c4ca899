//! ListFarmEventsHandler - Query handler for farm-wide, filtered listings.

use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventError};
use crate::domain::foundation::FarmId;
use crate::ports::{EventFilter, EventReader, Page, PageRequest};

#[derive(Debug, Clone)]
pub struct ListFarmEventsQuery {
    pub farm_id: FarmId,
    pub filter: EventFilter,
    pub page: PageRequest,
}

pub struct ListFarmEventsHandler {
    reader: Arc<dyn EventReader>,
}

impl ListFarmEventsHandler {
    pub fn new(reader: Arc<dyn EventReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListFarmEventsQuery) -> Result<Page<AnimalEvent>, EventError> {
        if let (Some(from), Some(until)) = (query.filter.from, query.filter.until) {
            if !from.is_before(&until) {
                return Err(EventError::validation("until", "must be after 'from'"));
            }
        }
        Ok(self
            .reader
            .find_by_farm(&query.farm_id, &query.filter, &query.page)
            .await?)
    }
}
